//! Connection reuse and DNS caching.
//!
//! Both objects are explicit dependencies: they are created once, stored in
//! the [`ClientConfig`](crate::ClientConfig) and shared by every request the
//! client issues. Cloning either one shares the underlying pool or cache.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};

/// Start a reqwest client builder with the settings shared by every client.
pub(crate) fn base_builder(user_agent: &str, dns_cache: Option<&DnsCache>) -> reqwest::ClientBuilder {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .gzip(true)
        .deflate(true);

    if let Some(cache) = dns_cache {
        builder = builder.dns_resolver(Arc::new(cache.clone()));
    }

    builder
}

/// Persistent connection pool reused across requests.
///
/// Requests issued without an agent use a client that keeps no idle
/// connections, so every call opens a new one.
///
/// The agent remembers the DNS cache its client resolves through; a client
/// configured with a different cache rejects the agent.
#[derive(Clone)]
pub struct KeepAliveAgent {
    client: reqwest::Client,
    dns_cache: Option<DnsCache>,
    id: Arc<()>,
}

impl KeepAliveAgent {
    /// Idle connections are dropped after this long.
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
    /// Maximum idle connections kept per host.
    pub const MAX_IDLE_PER_HOST: usize = 10;

    /// Build a keep-alive agent, resolving hosts through `dns_cache` when given.
    pub fn new(user_agent: &str, dns_cache: Option<&DnsCache>) -> Result<Self> {
        let client = base_builder(user_agent, dns_cache)
            .pool_idle_timeout(Self::IDLE_TIMEOUT)
            .pool_max_idle_per_host(Self::MAX_IDLE_PER_HOST)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self {
            client,
            dns_cache: dns_cache.cloned(),
            id: Arc::new(()),
        })
    }

    /// Wrap an existing reqwest client so its pool is shared with this library.
    ///
    /// The client's own resolver is used; such an agent cannot be combined
    /// with a [`DnsCache`].
    pub fn from_client(client: reqwest::Client) -> Self {
        Self {
            client,
            dns_cache: None,
            id: Arc::new(()),
        }
    }

    /// The pooled client.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The DNS cache the pooled client resolves through.
    pub fn dns_cache(&self) -> Option<&DnsCache> {
        self.dns_cache.as_ref()
    }
}

impl PartialEq for KeepAliveAgent {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.id, &other.id)
    }
}

impl std::fmt::Debug for KeepAliveAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAliveAgent").finish_non_exhaustive()
    }
}

/// Read-through cache of host name lookups.
///
/// Entries expire after the TTL and are resolved again on the next request.
#[derive(Clone)]
pub struct DnsCache {
    entries: Cache<String, Vec<SocketAddr>>,
    ttl: Duration,
    id: Arc<()>,
}

impl DnsCache {
    /// Default lifetime of a cached lookup.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
    /// Maximum number of cached hosts.
    pub const MAX_HOSTS: u64 = 1024;

    /// Create a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    /// Create a cache whose entries live for `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(Self::MAX_HOSTS)
                .build(),
            ttl,
            id: Arc::new(()),
        }
    }

    /// Lifetime of a cached lookup.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached addresses for `host`, if any.
    pub fn cached(&self, host: &str) -> Option<Vec<SocketAddr>> {
        self.entries.get(host)
    }

    /// Store addresses for `host`.
    pub fn insert(&self, host: impl Into<String>, addrs: Vec<SocketAddr>) {
        self.entries.insert(host.into(), addrs);
    }

    /// Number of live cached hosts.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached lookup.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
    }

    async fn lookup(&self, host: &str) -> std::io::Result<Vec<SocketAddr>> {
        if let Some(addrs) = self.cached(host) {
            debug!(host, "DNS cache hit");
            return Ok(addrs);
        }

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0)).await?.collect();
        debug!(host, count = addrs.len(), "DNS cache miss, resolved");
        self.insert(host, addrs.clone());
        Ok(addrs)
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for DnsCache {
    fn resolve(&self, name: Name) -> Resolving {
        let cache = self.clone();
        Box::pin(async move {
            let addrs = cache
                .lookup(name.as_str())
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok(addrs)
        })
    }
}

impl PartialEq for DnsCache {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.id, &other.id)
    }
}

impl std::fmt::Debug for DnsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
