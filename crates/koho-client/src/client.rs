//! The response dispatcher.
//!
//! [`KohoClient`] builds request options, sends them through the transport,
//! decodes the body in one of three ways and reissues throttled requests.

use std::sync::Arc;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{Request, RequestOptions, STREAM_PARAM};
use crate::response::check_api_error;
use crate::throttle::ThrottleController;
use crate::transport::HttpTransport;

/// Koho API client.
///
/// Cheap to clone; clones share the configuration and connection pool.
#[derive(Debug, Clone)]
pub struct KohoClient {
    config: Arc<ClientConfig>,
    transport: HttpTransport,
    throttle: ThrottleController,
}

impl KohoClient {
    /// Create a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        let throttle = ThrottleController::new(config.throttle.clone());

        Ok(Self {
            config: Arc::new(config),
            transport,
            throttle,
        })
    }

    /// Create a client from `KOHO_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Resolve a path against the base URL. Absolute URLs are returned as is.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    // =========================================================================
    // Dispatch variants
    // =========================================================================

    /// Send a request and decode the body as JSON.
    ///
    /// A payload carrying `status: "error"` becomes [`ErrorKind::Api`](crate::ErrorKind::Api).
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn request(&self, request: Request) -> Result<Value> {
        let options = RequestOptions::build(&request, &self.config)?;
        let transport = &self.transport;
        let options = &options;

        let value = self
            .throttle
            .run(self.config.max_throttle_retries(), || async move {
                transport.execute(options).await?.json_value().await
            })
            .await?;

        check_api_error(&value)?;
        Ok(value)
    }

    /// Send a request and deserialize the JSON body into `T`.
    pub async fn request_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let value = self.request(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Send a request and return the body as text.
    ///
    /// Used for CSV and other non-JSON report formats. The body is not
    /// inspected for `status: "error"`.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn request_text(&self, request: Request) -> Result<String> {
        let options = RequestOptions::build(&request, &self.config)?;
        let transport = &self.transport;
        let options = &options;

        self.throttle
            .run(self.config.max_throttle_retries(), || async move {
                transport.execute(options).await?.text().await
            })
            .await
    }

    /// Send a request and return the raw body bytes.
    ///
    /// Streaming is always disabled for binary downloads.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn request_buffer(&self, request: Request) -> Result<Bytes> {
        let mut options = RequestOptions::build(&request.disable_streaming(), &self.config)?;
        options.query.remove(STREAM_PARAM);
        let transport = &self.transport;
        let options = &options;

        self.throttle
            .run(self.config.max_throttle_retries(), || async move {
                transport.execute(options).await?.bytes().await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThrottleSettings;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> KohoClient {
        let config = ClientConfig::builder("test-token")
            .company_id(7)
            .base_url(base_url)
            .throttle(ThrottleSettings::default().delay(Duration::from_millis(5)))
            .build()
            .unwrap();
        KohoClient::new(config).unwrap()
    }

    #[test]
    fn test_url_resolution() {
        let client = client("https://suite.koho-online.com/api/");
        assert_eq!(
            client.url("contracts"),
            "https://suite.koho-online.com/api/contracts"
        );
        assert_eq!(
            client.url("/contracts/1"),
            "https://suite.koho-online.com/api/contracts/1"
        );
        assert_eq!(client.url("https://other.example/x"), "https://other.example/x");
    }

    #[tokio::test]
    async fn test_request_returns_decoded_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contracts"))
            .and(header("token", "test-token"))
            .and(query_param("company_id", "7"))
            .and(query_param("stream", "true"))
            .and(query_param("active", "true"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Cleaning"}])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let value = client
            .request(Request::get(client.url("contracts")).param("active", true))
            .await
            .unwrap();

        assert_eq!(value, json!([{"id": 1, "name": "Cleaning"}]));
    }

    #[tokio::test]
    async fn test_request_json_deserializes() {
        #[derive(serde::Deserialize)]
        struct Contract {
            id: u64,
        }

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contracts/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let contract: Contract = client
            .request_json(Request::get(client.url("contracts/3")))
            .await
            .unwrap();
        assert_eq!(contract.id, 3);
    }

    #[tokio::test]
    async fn test_status_error_payload_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/customers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "error", "message": "bad token"})),
            )
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let err = client
            .request(Request::get(client.url("customers")))
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Api { ref message } if message == "bad token"));
    }

    #[tokio::test]
    async fn test_throttled_request_is_reissued() {
        let mock_server = MockServer::start().await;
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        Mock::given(method("GET"))
            .and(path("/work_sessions"))
            .respond_with(move |_: &wiremock::Request| {
                if calls_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                    ResponseTemplate::new(200).set_body_json(json!({"throttle": true}))
                } else {
                    ResponseTemplate::new(200).set_body_json(json!([{"id": 11}]))
                }
            })
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let value = client
            .request(Request::get(client.url("work_sessions")))
            .await
            .unwrap();

        assert_eq!(value, json!([{"id": 11}]));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_throttle_disabled_returns_throttled_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/work_sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"throttle": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder("test-token")
            .company_id(7)
            .base_url(mock_server.uri())
            .throttle(ThrottleSettings::default().enabled(false))
            .build()
            .unwrap();
        let client = KohoClient::new(config).unwrap();

        let value = client
            .request(Request::get(client.url("work_sessions")))
            .await
            .unwrap();
        assert_eq!(value, json!({"throttle": true}));
    }

    #[tokio::test]
    async fn test_request_text_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/report/custom/4"))
            .and(query_param("format", "csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id;name\n1;Acme\n"))
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let text = client
            .request_text(Request::get(client.url("report/custom/4")).param("format", "csv"))
            .await
            .unwrap();

        assert_eq!(text, "id;name\n1;Acme\n");
    }

    #[tokio::test]
    async fn test_request_buffer_does_not_stream() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/datafiles/9"))
            .respond_with(move |req: &wiremock::Request| {
                let streaming = req.url.query_pairs().any(|(k, _)| k == "stream");
                if streaming {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_bytes(vec![0x25, 0x50, 0x44, 0x46])
                }
            })
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let bytes = client
            .request_buffer(Request::get(client.url("datafiles/9")))
            .await
            .unwrap();

        assert_eq!(bytes.as_ref(), b"%PDF");
    }

    #[tokio::test]
    async fn test_post_sends_body_without_stream_flag() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/customers"))
            .respond_with(move |req: &wiremock::Request| {
                let streaming = req.url.query_pairs().any(|(k, _)| k == "stream");
                let body: Value = serde_json::from_slice(&req.body).unwrap_or_default();
                if streaming || body != json!({"customer": {"name": "Acme"}}) {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({"id": 42}))
                }
            })
            .mount(&mock_server)
            .await;

        let client = client(&mock_server.uri());
        let value = client
            .request(Request::post(client.url("customers")).body(json!({"customer": {"name": "Acme"}})))
            .await
            .unwrap();

        assert_eq!(value["id"], 42);
    }
}
