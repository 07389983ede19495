use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::Resource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Company {
    const PATH: &'static str = "companies";
    const BODY_KEY: &'static str = "company";
}
