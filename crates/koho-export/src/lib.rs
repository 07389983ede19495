//! # koho-api-export
//!
//! Parsers for Koho API export payloads.
//!
//! Export endpoints return tables as arrays of arrays: a header row naming
//! columns in `table.column` form followed by data rows aligned to it.
//! This crate provides:
//!
//! - [`ExportTable`] - a validated header + rows table, from JSON or CSV
//! - [`ExportRecord`] - typed access to one row by column name
//! - [`join`] - attach detail rows to primary rows by a shared key
//! - [`fetch_table`] - issue an export request and parse the answer
//!
//! ## Example
//!
//! ```rust,ignore
//! use koho_api_export::{join, ExportTable, HeaderLayout};
//! use serde_json::json;
//!
//! let primary = ExportTable::from_value(json!([["id", "name"], ["1", "a"]]), HeaderLayout::Flat)?;
//! let detail = ExportTable::from_value(json!([["parent_id", "note"], ["1", "x"]]), HeaderLayout::Flat)?;
//!
//! for row in join(&primary, "id", Some(&detail), "parent_id")? {
//!     println!("{:?} has {} notes", row.record.string("name"), row.details.len());
//! }
//! ```

mod error;
mod fetch;
mod join;
mod record;
mod table;

pub use error::{Error, ErrorKind, Result};
pub use fetch::{fetch_table, JSON_FORMAT};
pub use join::{group_by, join, JoinedRecord};
pub use record::ExportRecord;
pub use table::{ExportTable, HeaderLayout};
