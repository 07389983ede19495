//! # koho-api-client
//!
//! Core HTTP client for the Koho business-management API.
//!
//! This crate provides:
//! - Request options building (auth parameters, token header, streaming flag)
//! - Transport retry with exponential backoff and jitter
//! - Throttle handling with a constant delay
//! - JSON, text and binary response dispatch
//! - Optional keep-alive connection reuse and DNS caching
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (koho-api-resources, koho-api facade)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KohoClient                             │
//! │  - Builds RequestOptions from Request + ClientConfig        │
//! │  - Decodes JSON / text / bytes                              │
//! │  - Reissues throttled requests (ThrottleController)         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    HttpTransport                            │
//! │  - Raw HTTP with transport retry and compression            │
//! │  - Keep-alive agent or no-pool client                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use koho_api_client::{ClientConfig, KohoClient, Request};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), koho_api_client::Error> {
//!     let config = ClientConfig::builder("my-token").company_id(1234).build()?;
//!     let client = KohoClient::new(config)?;
//!
//!     let contracts = client
//!         .request(Request::get(client.url("contracts")).param("active", true))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod agent;
mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod throttle;
mod transport;

pub use agent::{DnsCache, KeepAliveAgent};
pub use client::KohoClient;
pub use config::{
    ClientConfig, ClientConfigBuilder, RequestOverrides, ThrottleConfig, ThrottleSettings,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT,
};
pub use error::{Error, ErrorKind, Result};
pub use request::{
    CallOptions, QueryParams, Request, RequestBody, RequestMethod, RequestOptions, STREAM_PARAM,
    TOKEN_HEADER,
};
pub use response::{check_api_error, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy, DEFAULT_TRANSPORT_RETRIES};
pub use throttle::{ThrottleController, ThrottleSignal};
pub use transport::HttpTransport;

// Binary response bodies
pub use bytes::Bytes;

/// Default User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("koho-api/", env!("CARGO_PKG_VERSION"));
