//! HTTP transport: sends built [`RequestOptions`] with transport-level retry.

use tracing::{debug, info, instrument, warn};

use crate::agent::base_builder;
use crate::config::ClientConfig;
use crate::error::{is_retryable_status, Error, ErrorKind, Result};
use crate::request::{RequestBody, RequestOptions};
use crate::response::{parse_error_response, parse_retry_after, Response};
use crate::retry::{RetryConfig, RetryPolicy};

/// Sends requests over reqwest.
///
/// Requests carrying a [`KeepAliveAgent`](crate::KeepAliveAgent) go through
/// the agent's pooled client; all others use a client that keeps no idle
/// connections.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    oneshot: reqwest::Client,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Create a transport for the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let oneshot = base_builder(&config.user_agent, config.dns_cache.as_ref())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            oneshot,
            retry: config.transport_retry.clone(),
        })
    }

    /// Send a request, retrying transport failures up to `options.retry` times.
    #[instrument(skip(self, options), fields(method = %options.method, url = %options.url))]
    pub async fn execute(&self, options: &RequestOptions) -> Result<Response> {
        let mut policy = RetryPolicy::new(self.retry.clone(), options.retry);

        loop {
            match self.execute_once(options).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() => match policy.next_delay(err.retry_after()) {
                    Some(delay) => {
                        warn!(
                            attempt = policy.attempt(),
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Execute a single request without retry logic.
    async fn execute_once(&self, options: &RequestOptions) -> Result<Response> {
        let client = match &options.agent {
            Some(agent) => agent.client(),
            None => &self.oneshot,
        };

        let mut req = client
            .request(options.method.to_reqwest(), options.full_url()?)
            .timeout(options.timeout);

        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = options.body {
            req = match body {
                RequestBody::Json(value) => req.json(value),
                RequestBody::Text(text) => req.body(text.clone()),
                RequestBody::Bytes(bytes) => req.body(bytes.clone()),
                RequestBody::Form(data) => {
                    let encoded = serde_urlencoded::to_string(data).map_err(|e| {
                        Error::with_source(ErrorKind::InvalidInput(e.to_string()), e)
                    })?;
                    req.header("Content-Type", "application/x-www-form-urlencoded")
                        .body(encoded)
                }
            };
        }

        debug!(streaming = options.is_streaming(), "Sending request");

        let response = req.send().await?;
        let status = response.status().as_u16();

        if response.status().is_success() {
            debug!(status, content_length = response.content_length(), "Response received");
            return Ok(Response::new(response));
        }

        info!(status, "Non-success response");
        let retry_after = parse_retry_after(
            response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok()),
        );
        let body = response.text().await.unwrap_or_default();
        let err = parse_error_response(status, &body, retry_after);

        if is_retryable_status(status) && !err.is_retryable() {
            // Keep server errors retryable even when the body carried an API message
            return Err(Error::new(ErrorKind::Http {
                status,
                message: err.to_string(),
            }));
        }

        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DnsCache, KeepAliveAgent};
    use crate::request::Request;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig::builder("test-token")
            .company_id(5)
            .base_url(base_url)
            .transport_retry(RetryConfig::default().with_initial_delay(Duration::from_millis(5)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_successful_request_carries_token_and_auth_params() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/contracts"))
            .and(header("token", "test-token"))
            .and(query_param("company_id", "5"))
            .and(query_param("stream", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let options = RequestOptions::build(
            &Request::get(format!("{}/contracts", mock_server.uri())),
            &config,
        )
        .unwrap();

        let response = transport.execute(&options).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.json_value().await.unwrap(), json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_json_body_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/contracts/3"))
            .and(body_json(json!({"contract": {"name": "New"}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let request = Request::put(format!("{}/contracts/3", mock_server.uri()))
            .body(json!({"contract": {"name": "New"}}));
        let options = RequestOptions::build(&request, &config).unwrap();

        let response = transport.execute(&options).await.unwrap();
        assert_eq!(response.json_value().await.unwrap(), serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_retry_on_503() {
        let mock_server = MockServer::start().await;
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        Mock::given(method("GET"))
            .and(path("/retry"))
            .respond_with(move |_: &wiremock::Request| {
                let count = call_count_clone.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    ResponseTemplate::new(503)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({"ok": true}))
                }
            })
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let options = RequestOptions::build(
            &Request::get(format!("{}/retry", mock_server.uri())),
            &config,
        )
        .unwrap();

        let response = transport.execute(&options).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_count_is_bounded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let options = RequestOptions::build(
            &Request::get(format!("{}/down", mock_server.uri())).retry(1),
            &config,
        )
        .unwrap();

        let err = transport.execute(&options).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such record"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let options = RequestOptions::build(
            &Request::get(format!("{}/missing", mock_server.uri())),
            &config,
        )
        .unwrap();

        let err = transport.execute(&options).await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_keep_alive_agent_is_used() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pooled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder("test-token")
            .company_id(5)
            .base_url(mock_server.uri())
            .keep_alive(true)
            .build()
            .unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        let options = RequestOptions::build(
            &Request::get(format!("{}/pooled", mock_server.uri())),
            &config,
        )
        .unwrap();

        assert!(options.agent.is_some());
        transport.execute(&options).await.unwrap();
        transport.execute(&options).await.unwrap();
    }

    async fn resolve_through_cache(keep_alive: bool) {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/resolved"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = DnsCache::new();
        cache.insert("koho.invalid", vec![*mock_server.address()]);
        let base_url = format!("http://koho.invalid:{}", mock_server.address().port());

        let mut builder = ClientConfig::builder("test-token")
            .company_id(5)
            .base_url(base_url.as_str())
            .dns_cache_instance(cache.clone());
        if keep_alive {
            let agent = KeepAliveAgent::new(crate::USER_AGENT, Some(&cache)).unwrap();
            builder = builder.keep_alive_agent(agent);
        }
        let config = builder.build().unwrap();

        let transport = HttpTransport::new(&config).unwrap();
        let options =
            RequestOptions::build(&Request::get(format!("{base_url}/resolved")), &config).unwrap();

        assert_eq!(options.agent.is_some(), keep_alive);
        let response = transport.execute(&options).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_dns_cache_resolves_without_agent() {
        resolve_through_cache(false).await;
    }

    #[tokio::test]
    async fn test_dns_cache_resolves_through_shared_agent() {
        resolve_through_cache(true).await;
    }

    #[tokio::test]
    async fn test_form_body_is_url_encoded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/form"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = config(&mock_server.uri());
        let transport = HttpTransport::new(&config).unwrap();
        let mut form = std::collections::BTreeMap::new();
        form.insert("name".to_string(), "Acme Oy".to_string());
        let options = RequestOptions::build(
            &Request::post(format!("{}/form", mock_server.uri())).raw_body(RequestBody::Form(form)),
            &config,
        )
        .unwrap();

        transport.execute(&options).await.unwrap();
    }
}
