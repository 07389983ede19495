//! # koho-api
//!
//! A typed client library for the Koho business-management REST API.
//!
//! The library handles authentication parameters, throttling retries,
//! transport retries and the tabular export formats, and exposes the API's
//! resources as typed records.
//!
//! ## Crates
//!
//! - **koho-api-client** - HTTP client: request options, throttle retries, response dispatch
//! - **koho-api-export** - Export table parsing and the two-table foreign-key join
//! - **koho-api-resources** - Record types, generic CRUD and resource-specific operations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use koho_api::{date_range, ClientConfig, KohoApi, QueryParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     koho_api::init_tracing();
//!
//!     // KOHO_TOKEN and KOHO_COMPANY_ID
//!     let api = KohoApi::from_env()?;
//!
//!     let customers = api.customers().get_active(QueryParams::new()).await?;
//!     println!("{} active customers", customers.len());
//!
//!     let sessions = api
//!         .work_sessions()
//!         .export(date_range(start, end), false)
//!         .await?;
//!
//!     for session in sessions {
//!         println!("{:?}: {} products", session.id, session.products.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
#[cfg(feature = "client")]
pub use koho_api_client as client;
#[cfg(feature = "export")]
pub use koho_api_export as export;
#[cfg(feature = "resources")]
pub use koho_api_resources as resources;

// Re-export commonly used types at the top level
#[cfg(feature = "client")]
pub use koho_api_client::{ClientConfig, KohoClient, QueryParams, Request, ThrottleSettings};
#[cfg(feature = "export")]
pub use koho_api_export::{join, ExportTable, HeaderLayout};
#[cfg(feature = "resources")]
pub use koho_api_resources::*;

#[cfg(feature = "resources")]
mod api;
#[cfg(feature = "resources")]
pub use api::KohoApi;

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG`, `info` when unset.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
