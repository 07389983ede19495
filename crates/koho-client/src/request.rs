//! Request descriptors and the options builder.
//!
//! A [`Request`] is what a caller asks for. [`RequestOptions::build`] turns it
//! into the complete configuration of one outbound HTTP request by merging the
//! client configuration in.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

use crate::agent::{DnsCache, KeepAliveAgent};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::retry::DEFAULT_TRANSPORT_RETRIES;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "token";

/// Query flag asking the API to stream a GET response.
pub const STREAM_PARAM: &str = "stream";

/// HTTP request method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw request body, used instead of the JSON body when set.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Text(String),
    Bytes(Bytes),
    Form(BTreeMap<String, String>),
}

/// Ordered set of query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every parameter of `other` in, replacing values on collision.
    pub fn extend(&mut self, other: &QueryParams) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Per-call option overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    /// Raw body replacing the JSON body.
    pub body: Option<RequestBody>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    /// Transport retry count.
    pub retry: Option<u32>,
    pub disable_streaming: bool,
}

/// One call: url, method, body, query parameters and per-call overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub url: String,
    pub method: RequestMethod,
    pub body: Option<Value>,
    pub params: QueryParams,
    pub options: CallOptions,
}

impl Request {
    /// Create a new request.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            ..Default::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(RequestMethod::Delete, url)
    }

    /// Set the JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Replace all query parameters.
    pub fn params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }

    /// Replace the per-call options.
    pub fn options(mut self, options: CallOptions) -> Self {
        self.options = options;
        self
    }

    /// Send a raw body instead of the JSON body.
    pub fn raw_body(mut self, body: RequestBody) -> Self {
        self.options.body = Some(body);
        self
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.headers.insert(name.into(), value.into());
        self
    }

    /// Set the timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Set the transport retry count for this call.
    pub fn retry(mut self, retry: u32) -> Self {
        self.options.retry = Some(retry);
        self
    }

    /// Do not ask the API to stream this call.
    pub fn disable_streaming(mut self) -> Self {
        self.options.disable_streaming = true;
        self
    }
}

/// Complete configuration of one outbound HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: RequestMethod,
    pub url: String,
    pub query: QueryParams,
    pub body: Option<RequestBody>,
    pub headers: BTreeMap<String, String>,
    pub agent: Option<KeepAliveAgent>,
    pub dns_cache: Option<DnsCache>,
    pub timeout: Duration,
    /// Transport retry count.
    pub retry: u32,
}

impl RequestOptions {
    /// Build the options for `request` under `config`.
    ///
    /// Caller parameters win over auth parameters of the same name, and the
    /// global overrides in `config` win over everything else.
    pub fn build(request: &Request, config: &ClientConfig) -> Result<Self> {
        if request.url.trim().is_empty() {
            return Err(Error::config("Missing URL for request"));
        }

        let method = request.method;
        let call = &request.options;

        let mut query = config.auth_params();
        query.extend(&request.params);

        let body = match (&call.body, &request.body) {
            (Some(raw), _) => Some(raw.clone()),
            (None, Some(json)) if method != RequestMethod::Get => {
                Some(RequestBody::Json(json.clone()))
            }
            _ => None,
        };

        if method == RequestMethod::Get && !config.disable_streaming && !call.disable_streaming {
            query.insert(STREAM_PARAM, true);
        }

        let mut headers = call.headers.clone();
        headers.insert(TOKEN_HEADER.to_string(), config.token().to_string());

        let mut options = Self {
            method,
            url: request.url.clone(),
            query,
            body,
            headers,
            agent: config.keep_alive.clone(),
            dns_cache: config.dns_cache.clone(),
            timeout: call.timeout.unwrap_or(config.timeout),
            retry: call.retry.unwrap_or(DEFAULT_TRANSPORT_RETRIES),
        };

        let overrides = &config.overrides;
        if let Some(timeout) = overrides.timeout {
            options.timeout = timeout;
        }
        if let Some(retry) = overrides.retry {
            options.retry = retry;
        }
        options.headers.extend(overrides.headers.clone());
        options.query.extend(&overrides.query);

        Ok(options)
    }

    /// Returns true if the API is asked to stream the response.
    pub fn is_streaming(&self) -> bool {
        self.query.get(STREAM_PARAM) == Some("true")
    }

    /// Full URL with the query string appended.
    pub fn full_url(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }
}
