//! Client configuration.
//!
//! A [`ClientConfig`] is created once per client through
//! [`ClientConfig::builder`] and is read-only afterwards. Throttle settings
//! given by the caller are merged over the defaults when the config is built.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::agent::{DnsCache, KeepAliveAgent};
use crate::error::{Error, Result};
use crate::request::QueryParams;
use crate::retry::RetryConfig;

/// Default Koho API base URL.
pub const DEFAULT_BASE_URL: &str = "https://suite.koho-online.com/api";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Throttle policy: how to react when a response carries `throttle: true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Constant wait between attempts.
    pub delay: Duration,
    /// Whether throttled responses are retried at all.
    pub enabled: bool,
    /// Fail with `ThrottleExceeded` instead of returning the last throttled payload.
    pub fail_on_exhausted: bool,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(15_000),
            enabled: true,
            fail_on_exhausted: false,
        }
    }
}

impl ThrottleConfig {
    /// Apply caller-supplied settings over this policy.
    pub fn merge(mut self, settings: &ThrottleSettings) -> Self {
        if let Some(max_retries) = settings.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(delay) = settings.delay {
            self.delay = delay;
        }
        if let Some(enabled) = settings.enabled {
            self.enabled = enabled;
        }
        if let Some(fail) = settings.fail_on_exhausted {
            self.fail_on_exhausted = fail;
        }
        self
    }
}

/// Partial throttle settings; unset fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrottleSettings {
    pub max_retries: Option<u32>,
    pub delay: Option<Duration>,
    pub enabled: Option<bool>,
    pub fail_on_exhausted: Option<bool>,
}

impl ThrottleSettings {
    /// Set the retry budget.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the wait between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Enable or disable throttle retries.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Fail once the budget is used up.
    pub fn fail_on_exhausted(mut self, fail: bool) -> Self {
        self.fail_on_exhausted = Some(fail);
        self
    }
}

/// Global request-option overrides, applied after every computed option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOverrides {
    pub timeout: Option<Duration>,
    /// Transport retry count.
    pub retry: Option<u32>,
    pub headers: BTreeMap<String, String>,
    pub query: QueryParams,
}

impl RequestOverrides {
    /// Returns true if no override is set.
    pub fn is_empty(&self) -> bool {
        self.timeout.is_none()
            && self.retry.is_none()
            && self.headers.is_empty()
            && self.query.is_empty()
    }
}

/// Configuration for the Koho client.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) token: String,
    /// Company the requests act on.
    pub company_id: Option<u64>,
    /// Enterprise the requests act on.
    pub enterprise_id: Option<u64>,
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Default per-request timeout.
    pub timeout: Duration,
    /// Never ask the API to stream GET responses.
    pub disable_streaming: bool,
    /// Connection-reuse agent attached to every request.
    pub keep_alive: Option<KeepAliveAgent>,
    /// DNS cache used when resolving the API host.
    pub dns_cache: Option<DnsCache>,
    /// Throttle policy; `None` disables throttle retries.
    pub throttle: Option<ThrottleConfig>,
    /// Backoff for transport retries.
    pub transport_retry: RetryConfig,
    /// Overrides applied to every request.
    pub overrides: RequestOverrides,
    /// User-Agent header value.
    pub user_agent: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &"[REDACTED]")
            .field("company_id", &self.company_id)
            .field("enterprise_id", &self.enterprise_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("disable_streaming", &self.disable_streaming)
            .field("keep_alive", &self.keep_alive.is_some())
            .field("dns_cache", &self.dns_cache)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a new config builder for the given API token.
    pub fn builder(token: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder::new(token)
    }

    /// Build a config from `KOHO_*` environment variables.
    ///
    /// Reads `KOHO_TOKEN`, `KOHO_COMPANY_ID`, `KOHO_ENTERPRISE_ID`, `KOHO_URL`
    /// and `KOHO_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("KOHO_TOKEN").unwrap_or_default();
        let mut builder = Self::builder(token);

        if let Some(id) = lookup("KOHO_COMPANY_ID") {
            builder = builder.company_id(parse_env_number("KOHO_COMPANY_ID", &id)?);
        }
        if let Some(id) = lookup("KOHO_ENTERPRISE_ID") {
            builder = builder.enterprise_id(parse_env_number("KOHO_ENTERPRISE_ID", &id)?);
        }
        if let Some(url) = lookup("KOHO_URL") {
            builder = builder.base_url(url);
        }
        if let Some(ms) = lookup("KOHO_TIMEOUT_MS") {
            builder = builder.timeout(Duration::from_millis(parse_env_number("KOHO_TIMEOUT_MS", &ms)?));
        }

        builder.build()
    }

    /// The API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Query parameters identifying the company or enterprise.
    pub fn auth_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(id) = self.enterprise_id {
            params.insert("enterprise_id", id);
        }
        if let Some(id) = self.company_id {
            params.insert("company_id", id);
        }
        params
    }

    /// Retry budget handed to the throttle controller.
    pub fn max_throttle_retries(&self) -> u32 {
        self.throttle.as_ref().map_or(0, |t| t.max_retries)
    }
}

fn parse_env_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{key} is not a number: {value}")))
}

/// Whether and how the client keeps connections alive.
#[derive(Debug, Clone, Default)]
enum KeepAliveSetting {
    #[default]
    Disabled,
    Enabled,
    Shared(KeepAliveAgent),
}

/// Builder for ClientConfig.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    token: String,
    company_id: Option<u64>,
    enterprise_id: Option<u64>,
    base_url: String,
    timeout: Duration,
    disable_streaming: bool,
    keep_alive: KeepAliveSetting,
    dns_cache: Option<DnsCache>,
    throttle: Option<ThrottleSettings>,
    transport_retry: RetryConfig,
    overrides: RequestOverrides,
    user_agent: String,
}

impl ClientConfigBuilder {
    fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            company_id: None,
            enterprise_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            disable_streaming: false,
            keep_alive: KeepAliveSetting::Disabled,
            dns_cache: None,
            throttle: Some(ThrottleSettings::default()),
            transport_retry: RetryConfig::default(),
            overrides: RequestOverrides::default(),
            user_agent: crate::USER_AGENT.to_string(),
        }
    }

    /// Set the company id.
    pub fn company_id(mut self, id: u64) -> Self {
        self.company_id = Some(id);
        self
    }

    /// Set the enterprise id.
    pub fn enterprise_id(mut self, id: u64) -> Self {
        self.enterprise_id = Some(id);
        self
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disable API streaming for GET requests.
    pub fn disable_streaming(mut self, disabled: bool) -> Self {
        self.disable_streaming = disabled;
        self
    }

    /// Create a dedicated keep-alive agent for this client.
    pub fn keep_alive(mut self, enabled: bool) -> Self {
        self.keep_alive = if enabled {
            KeepAliveSetting::Enabled
        } else {
            KeepAliveSetting::Disabled
        };
        self
    }

    /// Share an existing keep-alive agent.
    pub fn keep_alive_agent(mut self, agent: KeepAliveAgent) -> Self {
        self.keep_alive = KeepAliveSetting::Shared(agent);
        self
    }

    /// Create a DNS cache with the default TTL for this client.
    pub fn dns_cache(mut self, enabled: bool) -> Self {
        self.dns_cache = enabled.then(DnsCache::new);
        self
    }

    /// Share an existing DNS cache.
    pub fn dns_cache_instance(mut self, cache: DnsCache) -> Self {
        self.dns_cache = Some(cache);
        self
    }

    /// Merge throttle settings over the defaults.
    pub fn throttle(mut self, settings: ThrottleSettings) -> Self {
        self.throttle = Some(settings);
        self
    }

    /// Remove the throttle policy entirely.
    pub fn without_throttle(mut self) -> Self {
        self.throttle = None;
        self
    }

    /// Set the transport retry backoff.
    pub fn transport_retry(mut self, retry: RetryConfig) -> Self {
        self.transport_retry = retry;
        self
    }

    /// Set global request-option overrides.
    pub fn overrides(mut self, overrides: RequestOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set custom User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate settings and build the configuration.
    pub fn build(self) -> Result<ClientConfig> {
        if self.token.trim().is_empty() {
            return Err(Error::config("No API token specified"));
        }

        if self.company_id.is_none() && self.enterprise_id.is_none() {
            return Err(Error::config("No company id or enterprise id specified"));
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;

        let mut dns_cache = self.dns_cache;
        let keep_alive = match self.keep_alive {
            KeepAliveSetting::Disabled => None,
            KeepAliveSetting::Enabled => {
                Some(KeepAliveAgent::new(&self.user_agent, dns_cache.as_ref())?)
            }
            KeepAliveSetting::Shared(agent) => {
                match (&dns_cache, agent.dns_cache()) {
                    (Some(cache), Some(agent_cache)) if cache != agent_cache => {
                        return Err(Error::config(
                            "Keep-alive agent resolves through a different DNS cache",
                        ));
                    }
                    (Some(_), None) => {
                        return Err(Error::config(
                            "Keep-alive agent was built without the configured DNS cache",
                        ));
                    }
                    _ => {}
                }
                if dns_cache.is_none() {
                    dns_cache = agent.dns_cache().cloned();
                }
                Some(agent)
            }
        };

        let throttle = self
            .throttle
            .map(|settings| ThrottleConfig::default().merge(&settings));

        Ok(ClientConfig {
            token: self.token,
            company_id: self.company_id,
            enterprise_id: self.enterprise_id,
            base_url,
            timeout: self.timeout,
            disable_streaming: self.disable_streaming,
            keep_alive,
            dns_cache,
            throttle,
            transport_retry: self.transport_retry,
            overrides: self.overrides,
            user_agent: self.user_agent,
        })
    }
}
