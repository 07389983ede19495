//! Customer incidents.
//!
//! Incidents live below customers: listing spans all customers, creation
//! targets one customer.

use koho_api_client::{KohoClient, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{Error, Result};
use crate::resource::{decode, wrap_body, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Incident {
    const PATH: &'static str = "customers/incidents";
    const BODY_KEY: &'static str = "incident";
}

/// Incident methods.
#[derive(Debug, Clone)]
pub struct IncidentMethods {
    client: KohoClient,
}

impl IncidentMethods {
    pub fn new(client: KohoClient) -> Self {
        Self { client }
    }

    /// All customer incidents.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Incident>> {
        let value = self
            .client
            .request(Request::get(self.client.url(Incident::PATH)))
            .await?;
        decode(value)
    }

    /// Create an incident for a customer.
    #[instrument(skip(self, incident))]
    pub async fn create(&self, customer_id: u64, incident: &Incident) -> Result<()> {
        if incident.id.is_some() {
            return Err(Error::invalid_input(
                "Cannot create incident: id was specified in properties",
            ));
        }

        let url = self.client.url(&format!("customers/{customer_id}/incidents"));
        let body = wrap_body(Incident::BODY_KEY, serde_json::to_value(incident)?);
        self.client.request(Request::post(url).body(body)).await?;
        Ok(())
    }
}
