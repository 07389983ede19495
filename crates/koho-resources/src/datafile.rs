use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::Resource;

/// Uploaded file attached to another record.
///
/// File content is binary; fetch it with `KohoClient::request_buffer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Datafile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Datafile {
    const PATH: &'static str = "datafiles";
    const BODY_KEY: &'static str = "datafile";
}
