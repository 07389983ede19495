//! Work session assignments, their requirements and templates.

use koho_api_client::{QueryParams, Request};
use koho_api_export::{fetch_table, join, ExportRecord, ExportTable, HeaderLayout};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::Result;
use crate::resource::{Resource, ResourceMethods};

const ASSIGNMENT_ID: &str = "work_session_assignments.id";

const REQUIREMENTS_SET: &str = "csv_export_requirements";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_plan: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_template_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoicing_type: Option<String>,
    #[serde(default)]
    pub requirements: Vec<WorkSessionAssignmentRequirement>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for WorkSessionAssignment {
    const PATH: &'static str = "work_session/assignments";
    const BODY_KEY: &'static str = "work_session_assignment";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionAssignmentRequirement {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub completed_at: Option<String>,
    pub date: Option<String>,
    pub assignment_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSessionAssignmentTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Resource for WorkSessionAssignmentTemplate {
    const PATH: &'static str = "work_session/assignment_templates";
    const BODY_KEY: &'static str = "work_session_assignment_template";
}

impl ResourceMethods<WorkSessionAssignment> {
    /// Export assignments with their requirements.
    ///
    /// Both export requests carry `params`; the second one selects the
    /// requirement set.
    #[instrument(skip(self, params))]
    pub async fn export(&self, params: QueryParams) -> Result<Vec<WorkSessionAssignment>> {
        let url = self.url("export");

        let mut requirement_params = params.clone();
        requirement_params.insert("set", REQUIREMENTS_SET);

        let assignments = fetch_table(
            self.client(),
            Request::get(url.clone()).params(params),
            HeaderLayout::Flat,
        )
        .await?;
        let requirements = fetch_table(
            self.client(),
            Request::get(url).params(requirement_params),
            HeaderLayout::Flat,
        )
        .await?;

        parse_assignments(&assignments, &requirements)
    }
}

/// Map the assignment export tables to records.
pub fn parse_assignments(
    assignments: &ExportTable,
    requirements: &ExportTable,
) -> Result<Vec<WorkSessionAssignment>> {
    let joined = join(assignments, ASSIGNMENT_ID, Some(requirements), ASSIGNMENT_ID)?;

    Ok(joined
        .into_iter()
        .map(|row| {
            let mut assignment = assignment(&row.record);
            assignment.requirements = row.details.iter().map(requirement).collect();
            assignment
        })
        .collect())
}

fn assignment(row: &ExportRecord<'_>) -> WorkSessionAssignment {
    WorkSessionAssignment {
        id: row.u64(ASSIGNMENT_ID),
        name: row.string("work_session_assignments.name"),
        sub_suffix: row.string("work_session_assignments.sub_suffix"),
        date: row.string("work_session_assignments.date"),
        term_start: row.string("work_session_assignments.term_start"),
        term_end: row.string("work_session_assignments.term_end"),
        description: row.string("work_session_assignments.description"),
        confirmed: row.bool("work_session_assignments.confirmed"),
        is_plan: row.bool("work_session_assignments.is_plan"),
        task_id: row.u64("work_session_assignments.task_id"),
        parent_id: row.u64("work_session_assignments.parent_id"),
        project_id: row.u64("projects.id"),
        assignment_template_id: row.u64("work_session_assignment_templates.id"),
        customer_id: row.u64("customers.id"),
        invoicing_type: row.string("work_session_assignments.invoicing_type"),
        requirements: Vec::new(),
        extra: Map::new(),
    }
}

fn requirement(row: &ExportRecord<'_>) -> WorkSessionAssignmentRequirement {
    WorkSessionAssignmentRequirement {
        id: row.u64("work_session_assignment_requirements.id"),
        name: row.string("work_session_assignment_requirements.name"),
        description: row.string("work_session_assignment_requirements.description"),
        completed_at: row.string("work_session_assignment_requirements.completed_at"),
        date: row.string("work_session_assignment_requirements.date"),
        assignment_id: row.u64(ASSIGNMENT_ID),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use koho_api_client::{ClientConfig, KohoClient};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn assignments_payload() -> Value {
        json!([
            [
                "work_session_assignments.id", "work_session_assignments.name",
                "work_session_assignments.confirmed", "work_session_assignments.is_plan",
                "projects.id", "customers.id"
            ],
            [1, "Window cleaning", true, "f", 7, 4],
            [2, "Floor waxing", null, 0, null, 4]
        ])
    }

    fn requirements_payload() -> Value {
        json!([
            [
                "work_session_assignment_requirements.id", "work_session_assignments.id",
                "work_session_assignment_requirements.name",
                "work_session_assignment_requirements.completed_at"
            ],
            [10, 1, "Ladder", "2024-03-01T10:00:00Z"],
            [11, "1", "Squeegee", null]
        ])
    }

    fn table(value: Value) -> ExportTable {
        ExportTable::from_value(value, HeaderLayout::Flat).unwrap()
    }

    #[test]
    fn test_parse_assignments() {
        let assignments = table(assignments_payload());
        let requirements = table(requirements_payload());

        let parsed = parse_assignments(&assignments, &requirements).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].confirmed, Some(true));
        assert_eq!(parsed[0].is_plan, Some(false));
        assert_eq!(parsed[0].project_id, Some(7));
        assert_eq!(parsed[0].requirements.len(), 2);
        assert_eq!(parsed[0].requirements[0].name.as_deref(), Some("Ladder"));
        assert_eq!(parsed[0].requirements[1].assignment_id, Some(1));
        assert_eq!(parsed[0].requirements[1].completed_at, None);

        assert_eq!(parsed[1].confirmed, None);
        assert_eq!(parsed[1].is_plan, Some(false));
        assert_eq!(parsed[1].project_id, None);
        assert!(parsed[1].requirements.is_empty());
    }

    #[test]
    fn test_assignment_without_requirements_serializes_empty_list() {
        let assignments = table(assignments_payload());
        let requirements = table(requirements_payload());
        let parsed = parse_assignments(&assignments, &requirements).unwrap();

        let value = serde_json::to_value(&parsed[1]).unwrap();
        assert_eq!(value["id"], json!(2));
        assert_eq!(value["requirements"], json!([]));
    }

    #[test]
    fn test_parse_requires_join_columns() {
        let assignments = table(assignments_payload());
        let requirements = table(json!([["work_session_assignment_requirements.id"], [10]]));

        let err = parse_assignments(&assignments, &requirements).unwrap_err();
        assert!(matches!(err.kind, crate::ErrorKind::Export(_)));
    }

    #[tokio::test]
    async fn test_export_passes_params_to_both_requests() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/work_session/assignments/export"))
            .and(query_param("set", REQUIREMENTS_SET))
            .and(query_param("customer_id", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(requirements_payload()))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/work_session/assignments/export"))
            .and(query_param("customer_id", "4"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(assignments_payload()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::builder("t")
            .company_id(1)
            .base_url(mock_server.uri())
            .build()
            .unwrap();
        let assignments =
            ResourceMethods::<WorkSessionAssignment>::new(KohoClient::new(config).unwrap())
                .export(QueryParams::from([("customer_id", 4)]))
                .await
                .unwrap();

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].requirements.len(), 2);
    }
}
