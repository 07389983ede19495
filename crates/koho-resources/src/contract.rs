//! Contracts.

use koho_api_client::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::Result;
use crate::resource::{decode, Resource, ResourceMethods};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contract {
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
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Contract {
    const PATH: &'static str = "contracts";
    const BODY_KEY: &'static str = "contract";
}

impl ResourceMethods<Contract> {
    /// Contracts of one customer.
    #[instrument(skip(self))]
    pub async fn get_by_customer_id(&self, customer_id: u64) -> Result<Vec<Contract>> {
        let url = self.url(&format!("find_by_customer/{customer_id}"));
        let value = self.client().request(Request::get(url)).await?;
        decode(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koho_api_client::{ClientConfig, KohoClient};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_by_customer_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contracts/find_by_customer/31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "Cleaning", "customer_id": 31, "number": 5001},
                {"id": 2, "name": "Snow removal", "customer_id": 31, "billing_day": 15}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder("t")
            .company_id(1)
            .base_url(mock_server.uri())
            .build()
            .unwrap();
        let contracts = ResourceMethods::<Contract>::new(KohoClient::new(config).unwrap())
            .get_by_customer_id(31)
            .await
            .unwrap();

        assert_eq!(contracts.len(), 2);
        assert_eq!(contracts[0].number.as_deref(), Some("5001"));
        assert_eq!(contracts[1].extra.get("billing_day"), Some(&json!(15)));
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let contract = Contract {
            name: Some("Cleaning".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&contract).unwrap(), json!({"name": "Cleaning"}));
    }
}
