//! Projects, project templates and project tasks.

use koho_api_client::{QueryParams, Request};
use koho_api_export::{fetch_table, ExportTable, HeaderLayout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::Result;
use crate::resource::{Resource, ResourceMethods};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for Project {
    const PATH: &'static str = "projects";
    const BODY_KEY: &'static str = "project";
}

/// Project template with its task templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_templates: Vec<ProjectTaskTemplate>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for ProjectTemplate {
    const PATH: &'static str = "project/templates";
    const BODY_KEY: &'static str = "project_template";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTaskTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoicing_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for ProjectTask {
    const PATH: &'static str = "project_tasks";
    const BODY_KEY: &'static str = "project_task";
}

impl ResourceMethods<ProjectTask> {
    /// Export project tasks through the tabular export endpoint.
    #[instrument(skip(self, params))]
    pub async fn export(&self, params: QueryParams) -> Result<Vec<ProjectTask>> {
        let request = Request::get(self.url("export")).params(params);
        let table = fetch_table(self.client(), request, HeaderLayout::Flat).await?;
        Ok(parse_project_tasks(&table))
    }
}

/// Map a project task export table to records.
pub fn parse_project_tasks(table: &ExportTable) -> Vec<ProjectTask> {
    table
        .records()
        .map(|row| ProjectTask {
            id: row.u64("project_tasks.id"),
            name: row.string("project_tasks.name"),
            description: row.string("project_tasks.description"),
            hidden: Some(row.flag("project_tasks.hidden")),
            customer_id: row.u64("customers.id"),
            customer_name: row.string("customers.name"),
            project_id: row.u64("projects.id"),
            project_name: row.string("projects.name"),
            template_id: row.u64("project_task_templates.id"),
            invoicing_type: row.string("project_tasks.invoicing_type"),
            extra: Map::new(),
        })
        .collect()
}
