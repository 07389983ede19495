//! Work sessions, shifts and the work session export.
//!
//! The export is the richest view of work sessions: it joins invoicing,
//! accounting and product data that the regular listing leaves out.

use koho_api_client::{QueryParams, Request};
use koho_api_export::{fetch_table, join, ExportRecord, ExportTable, HeaderLayout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::Result;
use crate::resource::{Resource, ResourceMethods};

/// Column joining products to work sessions in both export tables.
const WORK_SESSION_ID: &str = "work_sessions.id";

/// Export set holding the products of each work session.
const PRODUCTS_SET: &str = "csv_export_products";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by_manager: Option<bool>,

    // Invoicing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_price_per_hour: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_new_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_net_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_gross_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoicing_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_invoice_delegate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_hour: Option<f64>,

    // Accounting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_target_id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "crate::de::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub accounting_target_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_account_id: Option<u64>,
    #[serde(
        default,
        deserialize_with = "crate::de::string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub accounting_account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_target_2_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_target_3_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounting_target_4_id: Option<u64>,

    /// Products used in the session; filled by the export when requested.
    #[serde(default)]
    pub products: Vec<WorkSessionProduct>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for WorkSession {
    const PATH: &'static str = "work_sessions";
    const BODY_KEY: &'static str = "work_session";
}

/// Product line attached to a work session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionProduct {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub count: Option<f64>,
    pub product_type_id: Option<u64>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub code: Option<String>,
    pub accounting_target_id: Option<u64>,
    pub net_total: Option<f64>,
    pub worksession_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionShift {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_type_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for WorkSessionShift {
    const PATH: &'static str = "work_session/shifts";
    const BODY_KEY: &'static str = "work_session_shift";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionShiftType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for WorkSessionShiftType {
    const PATH: &'static str = "work_session/shift_types";
    const BODY_KEY: &'static str = "work_session_shift_type";
}

impl ResourceMethods<WorkSession> {
    /// Export work sessions, optionally with their products.
    ///
    /// Products come from a second export request that ignores `params`, so
    /// every product of the returned sessions is found. With
    /// `exclude_products` the second request is skipped and every session
    /// has an empty product list. Narrow `params` with `start_date` and
    /// `end_date`; exports are large.
    #[instrument(skip(self, params))]
    pub async fn export(
        &self,
        params: QueryParams,
        exclude_products: bool,
    ) -> Result<Vec<WorkSession>> {
        let url = self.url("export");
        let sessions = fetch_table(
            self.client(),
            Request::get(url.clone()).params(params),
            HeaderLayout::Nested,
        )
        .await?;

        let products = if exclude_products {
            None
        } else {
            let request = Request::get(url).param("set", PRODUCTS_SET);
            Some(fetch_table(self.client(), request, HeaderLayout::Nested).await?)
        };

        parse_work_sessions(&sessions, products.as_ref())
    }
}

/// Map the work session export tables to records.
///
/// `products` of `None` leaves every product list empty.
pub fn parse_work_sessions(
    sessions: &ExportTable,
    products: Option<&ExportTable>,
) -> Result<Vec<WorkSession>> {
    let joined = join(sessions, WORK_SESSION_ID, products, WORK_SESSION_ID)?;

    Ok(joined
        .into_iter()
        .map(|row| {
            let mut session = work_session(&row.record);
            session.products = row.details.iter().map(work_session_product).collect();
            session
        })
        .collect())
}

fn work_session(row: &ExportRecord<'_>) -> WorkSession {
    WorkSession {
        id: row.u64("work_sessions.id"),
        company_id: row.u64("work_sessions.company_id"),
        employee_id: row.u64("employees.id"),
        employee_name: row.string("employees.name"),
        customer_id: row.u64("customers.id"),
        customer_name: row.string("customers.name"),
        contract_id: row.u64("contracts.id"),
        project_id: row.u64("projects.id"),
        project_name: row.string("projects.name"),
        task_id: row.u64("project_tasks.id"),
        task_name: row.string("project_tasks.name"),
        assignment_id: row.u64("work_session_assignments.id"),
        description: row.string("work_sessions.description"),
        date: row.string("work_sessions.date"),
        start: row.string("work_sessions.start"),
        end: row.string("work_sessions.end"),
        created_at: row.string("work_sessions.created_at"),
        updated_at: row.string("work_sessions.updated_at"),
        hours: row.f64("work_sessions.hours"),
        confirmed: Some(row.flag("work_sessions.confirmed")),
        approved_by_manager: Some(row.flag("work_sessions.approved_by_manager")),
        invoice_id: row.u64("invoices.id"),
        invoice_name: row.string("invoices.name"),
        invoice_description: row.string("work_sessions.invoice_description"),
        invoice_hours: row.f64("work_sessions.invoice_hours"),
        invoice_price_per_hour: row.f64("work_sessions.invoice_price_per_hour"),
        invoice_new_amount: row.f64("work_sessions.invoice_new_amount"),
        invoice_net_amount: row.f64("work_sessions.invoice_net_amount"),
        invoice_gross_amount: row.f64("work_sessions.invoice_gross_amount"),
        invoicing_type: row.string("work_sessions.invoicing_type"),
        is_invoice_delegate: row.bool("work_sessions.is_invoice_delegate"),
        cost: row.f64("work_sessions.cost"),
        cost_per_hour: row.f64("work_sessions.cost_per_hour"),
        accounting_target_id: row.u64("work_sessions.accounting_target_id"),
        accounting_target_number: row.string("work_sessions.accounting_target_number"),
        accounting_account_id: row.u64("work_sessions.accounting_account_id"),
        accounting_account_number: row.string("work_sessions.accounting_account_number"),
        accounting_target_2_id: row.u64("work_sessions.accounting_target_2_id"),
        accounting_target_3_id: row.u64("work_sessions.accounting_target_3_id"),
        accounting_target_4_id: row.u64("work_sessions.accounting_target_4_id"),
        products: Vec::new(),
        extra: Map::new(),
    }
}

fn work_session_product(row: &ExportRecord<'_>) -> WorkSessionProduct {
    WorkSessionProduct {
        id: row.u64("products.id"),
        name: row.string("product_types.name"),
        count: row.f64("products.count"),
        product_type_id: row.u64("product_types.id"),
        price: row.f64("products.price"),
        description: row.string("products.description"),
        cost: row.f64("products.cost"),
        code: row.string("product_types.code"),
        accounting_target_id: row.u64("products.accounting_target_id"),
        net_total: row.f64("products.net_total"),
        worksession_id: row.u64(WORK_SESSION_ID),
    }
}
