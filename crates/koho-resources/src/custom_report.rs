//! Custom reports.
//!
//! Reports are read-only and take their own parameter shape, so they get a
//! dedicated methods type instead of the generic CRUD component.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use koho_api_client::{KohoClient, QueryParams, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::Result;
use crate::params::format_date;
use crate::resource::{decode, Resource};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for CustomReport {
    const PATH: &'static str = "report/custom";
    const BODY_KEY: &'static str = "custom_report";
}

/// Parameters of one report run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportParams {
    /// Sent as `settings[key]=value`.
    pub settings: BTreeMap<String, String>,
    /// Output format; anything but `json` is returned as text.
    pub format: Option<String>,
    pub params: QueryParams,
}

impl ReportParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setting(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.settings.insert(key.into(), value.to_string());
        self
    }

    /// Report period, `settings[term_start]` and `settings[term_end]`.
    pub fn term(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.setting("term_start", format_date(start))
            .setting("term_end", format_date(end))
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key, value);
        self
    }

    fn is_json(&self) -> bool {
        self.format.as_deref().is_none_or(|format| format == "json")
    }

    fn to_query(&self) -> QueryParams {
        let mut query: QueryParams = self
            .settings
            .iter()
            .map(|(key, value)| (format!("settings[{key}]"), value))
            .collect();
        query.extend(&self.params);
        if let Some(format) = &self.format {
            query.insert("format", format);
        }
        query
    }
}

/// Report output.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutput {
    Json(Value),
    /// CSV or another text format; parse CSV with `ExportTable::from_csv`.
    Text(String),
}

impl ReportOutput {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ReportOutput::Json(value) => Some(value),
            ReportOutput::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReportOutput::Text(text) => Some(text),
            ReportOutput::Json(_) => None,
        }
    }
}

/// Custom report methods.
#[derive(Debug, Clone)]
pub struct CustomReportMethods {
    client: KohoClient,
}

impl CustomReportMethods {
    pub fn new(client: KohoClient) -> Self {
        Self { client }
    }

    /// Report definitions.
    #[instrument(skip(self, params))]
    pub async fn get_all(&self, params: QueryParams) -> Result<Vec<CustomReport>> {
        let url = self.client.url(CustomReport::PATH);
        let value = self.client.request(Request::get(url).params(params)).await?;
        decode(value)
    }

    /// Run report `id`.
    #[instrument(skip(self, params))]
    pub async fn get_by_id(&self, id: u64, params: &ReportParams) -> Result<ReportOutput> {
        let url = self.client.url(&format!("{}/{id}", CustomReport::PATH));
        let request = Request::get(url).params(params.to_query());

        if params.is_json() {
            Ok(ReportOutput::Json(self.client.request(request).await?))
        } else {
            Ok(ReportOutput::Text(self.client.request_text(request).await?))
        }
    }
}
