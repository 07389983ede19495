use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::Resource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::de::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_total: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Invoice {
    const PATH: &'static str = "invoices";
    const BODY_KEY: &'static str = "invoice";
}
