//! Project tools: listing, counting, and per-project issue totals

use crate::error::{JiraMcpError, JiraMcpResult};
use crate::jira_client::JiraApi;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Parameters for get_issues_count_for_project
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ProjectKeyParams {
    /// The project key (e.g., "ENG")
    pub project_key: String,
}

/// Project operations over a [`JiraApi`]
pub struct ProjectTools {
    jira: Arc<dyn JiraApi>,
}

impl ProjectTools {
    pub fn new(jira: Arc<dyn JiraApi>) -> Self {
        Self { jira }
    }

    /// Every project, archived or not, without expansions
    #[instrument(skip(self))]
    pub async fn get_projects(&self) -> JiraMcpResult<Value> {
        self.jira.projects().await
    }

    /// Number of projects; fetches the full list since Jira has no count endpoint
    #[instrument(skip(self))]
    pub async fn get_projects_count(&self) -> JiraMcpResult<usize> {
        let projects = self.jira.projects().await?;
        let count = projects.as_array().map(Vec::len).ok_or_else(|| {
            JiraMcpError::unexpected_response(format!(
                "expected a list of projects, got {}",
                json_type_name(&projects)
            ))
        })?;

        info!("Found {} projects", count);
        Ok(count)
    }

    /// Total issues matching `project = <key>`, read from the search total
    #[instrument(skip(self))]
    pub async fn get_issue_count_for_project(
        &self,
        params: ProjectKeyParams,
    ) -> JiraMcpResult<u64> {
        let jql = format!("project = {}", params.project_key);

        // The total is reported independently of the page size
        let result = self
            .jira
            .jql(&jql, Some("key"), Some(1))
            .await
            .map_err(|e| {
                error!(
                    "Failed to count issues for project {}: {}",
                    params.project_key, e
                );
                e
            })?;

        if !result.is_object() {
            return Err(JiraMcpError::unexpected_response(format!(
                "expected an object from the issue search, got {}",
                json_type_name(&result)
            )));
        }

        let total = result.get("total").and_then(Value::as_u64).unwrap_or(0);
        info!("Project {} has {} issues", params.project_key, total);
        Ok(total)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
