//! Generic CRUD methods shared by every resource.

use std::marker::PhantomData;

use koho_api_client::{KohoClient, QueryParams, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{Error, Result};

/// A Koho API resource type.
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Endpoint path relative to the API base URL, e.g. `contracts`.
    const PATH: &'static str;

    /// Key wrapping the properties in create and update bodies, e.g. `contract`.
    const BODY_KEY: &'static str;
}

/// CRUD methods for resource `R`.
///
/// Resource-specific operations are added as inherent methods on
/// `ResourceMethods<SpecificResource>`.
pub struct ResourceMethods<R> {
    client: KohoClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceMethods<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<R> std::fmt::Debug for ResourceMethods<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceMethods")
            .field("resource", &std::any::type_name::<R>())
            .finish()
    }
}

impl<R> ResourceMethods<R> {
    pub fn new(client: KohoClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    /// The underlying client, for raw `request`/`request_text`/`request_buffer` calls.
    pub fn client(&self) -> &KohoClient {
        &self.client
    }
}

impl<R: Resource> ResourceMethods<R> {
    /// Absolute URL of the collection or of a sub-path below it.
    pub fn url(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.client.url(R::PATH)
        } else {
            self.client.url(&format!("{}/{}", R::PATH, suffix))
        }
    }

    /// List records, passing `params` as query filters.
    #[instrument(skip(self, params), fields(resource = R::PATH))]
    pub async fn get_all(&self, params: QueryParams) -> Result<Vec<R>> {
        let value = self.client.request(Request::get(self.url("")).params(params)).await?;
        decode(value)
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn get_by_id(&self, id: u64) -> Result<R> {
        let value = self.client.request(Request::get(self.url(&id.to_string()))).await?;
        decode(value)
    }

    /// Update a record with a partial set of properties.
    #[instrument(skip(self, properties), fields(resource = R::PATH))]
    pub async fn update_by_id<P: Serialize + ?Sized>(&self, id: u64, properties: &P) -> Result<()> {
        let body = wrap_body(R::BODY_KEY, serde_json::to_value(properties)?);
        self.client
            .request(Request::put(self.url(&id.to_string())).body(body))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(resource = R::PATH))]
    pub async fn delete_by_id(&self, id: u64) -> Result<()> {
        self.client.request(Request::delete(self.url(&id.to_string()))).await?;
        Ok(())
    }

    /// Create a record and return it as stored by the API.
    ///
    /// The properties must not carry an `id`. The new record is read back
    /// with [`get_by_id`](Self::get_by_id).
    #[instrument(skip(self, properties), fields(resource = R::PATH))]
    pub async fn create<P: Serialize + ?Sized>(&self, properties: &P) -> Result<R> {
        let properties = serde_json::to_value(properties)?;
        if properties.get("id").is_some_and(|id| !id.is_null()) {
            return Err(Error::invalid_input(format!(
                "Cannot create {}: id was specified in properties",
                R::BODY_KEY
            )));
        }

        let created = self
            .client
            .request(Request::post(self.url("")).body(wrap_body(R::BODY_KEY, properties)))
            .await?;
        let id = record_id(&created).ok_or_else(|| {
            Error::unexpected(format!("create {} response has no id: {created}", R::BODY_KEY))
        })?;

        self.get_by_id(id).await
    }
}

/// `{ key: properties }`
pub(crate) fn wrap_body(key: &str, properties: Value) -> Value {
    let mut body = Map::new();
    body.insert(key.to_string(), properties);
    Value::Object(body)
}

/// Numeric `id` of a response object; numeric strings are accepted.
pub(crate) fn record_id(value: &Value) -> Option<u64> {
    match value.get("id")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use koho_api_client::ClientConfig;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: Option<u64>,
        name: Option<String>,
    }

    impl Resource for Widget {
        const PATH: &'static str = "widgets";
        const BODY_KEY: &'static str = "widget";
    }

    fn methods(base_url: &str) -> ResourceMethods<Widget> {
        let config = ClientConfig::builder("test-token")
            .company_id(1)
            .base_url(base_url)
            .build()
            .unwrap();
        ResourceMethods::new(KohoClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_get_all_passes_params() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/widgets"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "name": "a"},
                {"id": 2, "name": "b"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let widgets = methods(&mock_server.uri())
            .get_all(QueryParams::from([("limit", 2)]))
            .await
            .unwrap();

        assert_eq!(widgets.len(), 2);
        assert_eq!(widgets[1].name.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_update_wraps_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/widgets/4"))
            .and(body_json(json!({"widget": {"name": "renamed"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 4})))
            .expect(1)
            .mount(&mock_server)
            .await;

        methods(&mock_server.uri())
            .update_by_id(4, &json!({"name": "renamed"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/widgets/9"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        methods(&mock_server.uri()).delete_by_id(9).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_reads_back_record() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/widgets"))
            .and(body_json(json!({"widget": {"id": null, "name": "new"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/widgets/12"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": 12, "name": "new"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let created = methods(&mock_server.uri())
            .create(&Widget {
                id: None,
                name: Some("new".into()),
            })
            .await
            .unwrap();

        assert_eq!(created.id, Some(12));
    }

    #[tokio::test]
    async fn test_create_rejects_id() {
        let err = methods("https://suite.koho-online.com/api")
            .create(&json!({"id": 3, "name": "dup"}))
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/widgets/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "error", "message": "Not allowed"})),
            )
            .mount(&mock_server)
            .await;

        let err = methods(&mock_server.uri()).get_by_id(1).await.unwrap_err();
        assert!(err.is_api_error());
        assert!(err.to_string().contains("Not allowed"));
    }

    #[tokio::test]
    async fn test_unexpected_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": 1})))
            .mount(&mock_server)
            .await;

        let err = methods(&mock_server.uri())
            .get_all(QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedResponse(_)));
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&json!({"id": 5})), Some(5));
        assert_eq!(record_id(&json!({"id": "6"})), Some(6));
        assert_eq!(record_id(&json!({"name": "x"})), None);
    }
}
