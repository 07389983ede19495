//! # koho-api-resources
//!
//! Typed Koho API resources.
//!
//! Every resource is a record type implementing [`Resource`]; the generic
//! [`ResourceMethods`] gives each one the same CRUD surface:
//!
//! - **get_all** - list records, filtered by query parameters
//! - **get_by_id** - fetch one record
//! - **create** - create a record and return the stored version
//! - **update_by_id** - update fields of a record
//! - **delete_by_id** - delete a record
//!
//! Resources with extra endpoints add inherent methods on their
//! `ResourceMethods<R>`, e.g. customer lookups by name and the work session,
//! assignment and project task exports.
//!
//! ## Example
//!
//! ```rust,ignore
//! use koho_api_client::{ClientConfig, KohoClient};
//! use koho_api_resources::{date_range, Customer, ResourceMethods, WorkSession};
//!
//! let client = KohoClient::new(ClientConfig::from_env()?)?;
//!
//! let customers = ResourceMethods::<Customer>::new(client.clone());
//! let acme = customers.get_by_name("Acme Oy", true).await?;
//!
//! let sessions = ResourceMethods::<WorkSession>::new(client)
//!     .export(date_range(start, end), false)
//!     .await?;
//! ```

mod accounting;
mod assignment;
mod company;
mod contract;
mod custom_report;
mod customer;
mod datafile;
mod de;
mod employee;
mod error;
mod incident;
mod invoice;
mod notification;
mod params;
mod product;
mod project;
mod resource;
mod sales;
mod work_session;

// Generic CRUD
pub use resource::{Resource, ResourceMethods};

// Error types
pub use error::{Error, ErrorKind, Result};

// Query parameter helpers
pub use params::{date_range, format_date, page, updated_after};

// Record types
pub use accounting::{AccountingAssignment, AccountingTarget};
pub use assignment::{
    parse_assignments, WorkSessionAssignment, WorkSessionAssignmentRequirement,
    WorkSessionAssignmentTemplate,
};
pub use company::Company;
pub use contract::Contract;
pub use custom_report::{CustomReport, CustomReportMethods, ReportOutput, ReportParams};
pub use customer::{
    Customer, CustomerCategory, CustomerFinancialStatement, CustomerGroup, Person,
};
pub use datafile::Datafile;
pub use employee::{Employee, EmployeeProfile, EmployeeTeam};
pub use incident::{Incident, IncidentMethods};
pub use invoice::Invoice;
pub use notification::Notification;
pub use product::{Product, ProductCatalog};
pub use project::{parse_project_tasks, Project, ProjectTask, ProjectTaskTemplate, ProjectTemplate};
pub use sales::{Offer, Sale};
pub use work_session::{
    parse_work_sessions, WorkSession, WorkSessionProduct, WorkSessionShift, WorkSessionShiftType,
};
