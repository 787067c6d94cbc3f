//! Issue tools
//!
//! Read, search, link traversal, comments, creation and updates of single
//! issues. Reads propagate failures; `add_comment`, `create_issue` and
//! `update_issue` report them as `{"error": ...}` through [`ToolOutcome`].

use crate::error::{JiraMcpError, JiraMcpResult, ToolOutcome};
use crate::jira_client::JiraApi;
use crate::models::{fields_or_default, IssueSummary, JiraIssue, LinkedIssue};
use crate::shaping::{extract_linked_issues, strip_nulls, summarize_issues, text_search_jql};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

fn default_page_limit() -> u32 {
    20
}

fn default_text_search_limit() -> u32 {
    10
}

/// Parameters for get_issues_for_board
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetIssuesForBoardParams {
    /// The ID of the Jira agile board
    pub board_id: String,

    /// JQL to filter the board's issues (empty for all)
    #[serde(default)]
    pub jql: String,

    /// Comma-separated fields to return; defaults to summary, description,
    /// status, assignee, reporter, labels, priority, created, updated, issuetype
    #[serde(default)]
    pub fields: Option<String>,

    /// Index of the first issue to return (default: 0)
    #[serde(default)]
    pub start_at: u32,

    /// Maximum number of issues to return (default: 20)
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

/// Parameters for get_issues_for_project
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetIssuesForProjectParams {
    /// The project key (e.g., "ENG")
    pub project_key: String,

    /// Comma-separated fields to return; same default as get_issues_for_board
    #[serde(default)]
    pub fields: Option<String>,

    /// Index of the first issue to return (default: 0)
    #[serde(default)]
    pub start_at: u32,

    /// Maximum number of issues to return (default: 20)
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

/// Parameters naming a single issue
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct IssueKeyParams {
    /// The Jira issue key or ID (e.g., "ENG-123")
    pub issue_key: String,
}

/// Parameters for get_issues
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetIssuesParams {
    /// JQL query selecting the issues
    pub jql: String,
}

/// Parameters for add_comment
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AddCommentParams {
    /// The Jira issue key (e.g., "ENG-123")
    pub issue_key: String,

    /// Comment text
    pub comment: String,
}

/// Parameters for get_linked_issues
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetLinkedIssuesParams {
    /// The Jira issue key (e.g., "ENG-123")
    pub issue_key: String,

    /// Only return links with this phrase (e.g., "blocks", "is blocked by"),
    /// compared ignoring case. Omit to return all links.
    #[serde(default)]
    pub relationship_type: Option<String>,
}

/// Parameters for search_issues_by_text
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchIssuesByTextParams {
    /// Text to look for in summaries, descriptions and comments
    /// (an error message, stack trace fragment or keyword)
    pub text: String,

    /// Maximum number of issues to return (default: 10)
    #[serde(default = "default_text_search_limit")]
    pub max_results: u32,
}

/// Parameters for create_issue
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateIssueParams {
    /// Project key where the issue will be created (e.g., "ENG")
    pub project_key: String,

    /// Issue type name (e.g., "Bug", "Task", "Story")
    pub issue_type: String,

    /// Issue summary/title
    pub summary: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Priority name (e.g., "High")
    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub labels: Option<Vec<String>>,

    /// Assignee user name
    #[serde(default)]
    pub assignee: Option<String>,

    /// Additional raw fields (field id -> value), applied last
    #[serde(default)]
    pub extra_fields: Option<HashMap<String, Value>>,
}

/// Parameters for update_issue
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateIssueParams {
    /// The Jira issue key (e.g., "ENG-123")
    pub issue_key: String,

    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Priority name (e.g., "High")
    #[serde(default)]
    pub priority: Option<String>,

    /// Replaces the issue's labels
    #[serde(default)]
    pub labels: Option<Vec<String>>,

    /// Assignee user name
    #[serde(default)]
    pub assignee: Option<String>,

    /// Target status name; applied through the matching workflow transition
    #[serde(default)]
    pub status: Option<String>,

    /// Additional raw fields (field id -> value), applied last
    #[serde(default)]
    pub extra_fields: Option<HashMap<String, Value>>,
}

/// Optional values shared by create and update, included only when non-empty
struct OptionalFields<'a> {
    description: Option<&'a str>,
    priority: Option<&'a str>,
    labels: Option<&'a [String]>,
    assignee: Option<&'a str>,
    extra_fields: Option<&'a HashMap<String, Value>>,
}

impl OptionalFields<'_> {
    fn apply(&self, fields: &mut Map<String, Value>) {
        if let Some(description) = self.description.filter(|d| !d.is_empty()) {
            fields.insert("description".to_string(), json!(description));
        }
        if let Some(priority) = self.priority.filter(|p| !p.is_empty()) {
            fields.insert("priority".to_string(), json!({ "name": priority }));
        }
        if let Some(labels) = self.labels.filter(|l| !l.is_empty()) {
            fields.insert("labels".to_string(), json!(labels));
        }
        if let Some(assignee) = self.assignee.filter(|a| !a.is_empty()) {
            fields.insert("assignee".to_string(), json!({ "name": assignee }));
        }
        if let Some(extra) = self.extra_fields {
            for (field_id, value) in extra {
                fields.insert(field_id.clone(), value.clone());
            }
        }
    }
}

/// Field map sent to Jira when creating an issue
pub fn build_create_fields(params: &CreateIssueParams) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        "project".to_string(),
        json!({ "key": params.project_key }),
    );
    fields.insert(
        "issuetype".to_string(),
        json!({ "name": params.issue_type }),
    );
    fields.insert("summary".to_string(), json!(params.summary));

    OptionalFields {
        description: params.description.as_deref(),
        priority: params.priority.as_deref(),
        labels: params.labels.as_deref(),
        assignee: params.assignee.as_deref(),
        extra_fields: params.extra_fields.as_ref(),
    }
    .apply(&mut fields);

    fields
}

/// Field writes requested by an update; the status is handled separately
pub fn build_update_fields(params: &UpdateIssueParams) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(summary) = params.summary.as_deref().filter(|s| !s.is_empty()) {
        fields.insert("summary".to_string(), json!(summary));
    }

    OptionalFields {
        description: params.description.as_deref(),
        priority: params.priority.as_deref(),
        labels: params.labels.as_deref(),
        assignee: params.assignee.as_deref(),
        extra_fields: params.extra_fields.as_ref(),
    }
    .apply(&mut fields);

    fields
}

/// Serialize with the 4-space indentation callers of the listing tools expect
fn to_pretty_json(value: &Value) -> JiraMcpResult<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer)
        .map_err(|e| JiraMcpError::internal(format!("Invalid UTF-8 in JSON output: {}", e)))
}

/// Issue operations over a [`JiraApi`]
pub struct IssueTools {
    jira: Arc<dyn JiraApi>,
}

impl IssueTools {
    pub fn new(jira: Arc<dyn JiraApi>) -> Self {
        Self { jira }
    }

    /// Raw board page, pretty-printed
    #[instrument(skip(self))]
    pub async fn get_issues_for_board(
        &self,
        params: GetIssuesForBoardParams,
    ) -> JiraMcpResult<String> {
        let fields = fields_or_default(params.fields.as_deref());
        let issues = self
            .jira
            .board_issues(
                &params.board_id,
                &params.jql,
                &fields,
                params.start_at,
                params.limit,
            )
            .await?;
        to_pretty_json(&issues)
    }

    /// Raw project page, pretty-printed
    #[instrument(skip(self))]
    pub async fn get_issues_for_project(
        &self,
        params: GetIssuesForProjectParams,
    ) -> JiraMcpResult<String> {
        let fields = fields_or_default(params.fields.as_deref());
        let issues = self
            .jira
            .project_issues(&params.project_key, &fields, params.start_at, params.limit)
            .await?;
        to_pretty_json(&issues)
    }

    /// The issue with every null removed
    #[instrument(skip(self))]
    pub async fn get_issue(&self, params: IssueKeyParams) -> JiraMcpResult<Value> {
        let issue = self.jira.issue(&params.issue_key, None).await?;
        Ok(strip_nulls(issue))
    }

    /// Typed overview of an issue, with placeholders for missing values
    #[instrument(skip(self))]
    pub async fn get_issue_overview(&self, params: IssueKeyParams) -> JiraMcpResult<JiraIssue> {
        let issue = self.jira.issue(&params.issue_key, None).await?;
        Ok(JiraIssue::from_remote(&issue, self.jira.base_url()))
    }

    /// Comments of an issue, as returned by Jira
    #[instrument(skip(self))]
    pub async fn get_issue_comments(&self, params: IssueKeyParams) -> JiraMcpResult<Value> {
        self.jira.issue_comments(&params.issue_key).await
    }

    /// Add a comment, reporting a failure as `{"error": ...}`
    #[instrument(skip(self), fields(issue_key = params.issue_key.as_str()))]
    pub async fn add_comment(&self, params: AddCommentParams) -> ToolOutcome<Value> {
        self.jira
            .add_comment(&params.issue_key, &params.comment)
            .await
            .into()
    }

    /// Run a JQL query and project each hit to key, summary and status
    #[instrument(skip(self))]
    pub async fn get_issues(&self, params: GetIssuesParams) -> JiraMcpResult<Vec<IssueSummary>> {
        let response = self.jira.jql(&params.jql, None, None).await?;
        let issues = summarize_issues(&response);
        info!("JQL returned {} issues", issues.len());
        Ok(issues)
    }

    /// Issues linked to the given one, optionally filtered by link phrase
    #[instrument(skip(self))]
    pub async fn get_linked_issues(
        &self,
        params: GetLinkedIssuesParams,
    ) -> JiraMcpResult<Vec<LinkedIssue>> {
        let issue = self
            .jira
            .issue(&params.issue_key, Some("issuelinks"))
            .await?;
        let links = extract_linked_issues(&issue, params.relationship_type.as_deref());
        debug!("Issue {} has {} matching links", params.issue_key, links.len());
        Ok(links)
    }

    /// Free-text search over summary, description and comments
    #[instrument(skip(self))]
    pub async fn search_issues_by_text(
        &self,
        params: SearchIssuesByTextParams,
    ) -> JiraMcpResult<Vec<IssueSummary>> {
        let jql = text_search_jql(&params.text);
        debug!("Text search JQL: {}", jql);

        let response = self
            .jira
            .jql(&jql, None, Some(params.max_results))
            .await?;
        Ok(summarize_issues(&response))
    }

    /// Create an issue, returning Jira's reference or `{"error": ...}`
    #[instrument(skip(self))]
    pub async fn create_issue(&self, params: CreateIssueParams) -> ToolOutcome<Value> {
        let fields = build_create_fields(&params);
        self.jira
            .create_issue(fields)
            .await
            .map(strip_nulls)
            .into()
    }

    /// Write fields and/or move the issue to a new status, then return it re-read
    #[instrument(skip(self))]
    pub async fn update_issue(&self, params: UpdateIssueParams) -> ToolOutcome<Value> {
        self.apply_update(params).await.into()
    }

    /// Resolve the transition first so an unknown status leaves the issue untouched
    async fn apply_update(&self, params: UpdateIssueParams) -> JiraMcpResult<Value> {
        let transition = match params.status.as_deref().filter(|s| !s.is_empty()) {
            Some(status) => {
                let wanted = status.to_lowercase();
                let transitions = self.jira.issue_transitions(&params.issue_key).await?;
                let found = transitions
                    .into_iter()
                    .find(|t| t.name.to_lowercase() == wanted)
                    .ok_or_else(|| JiraMcpError::transition_unavailable(status))?;
                Some(found)
            }
            None => None,
        };

        let fields = build_update_fields(&params);
        if !fields.is_empty() {
            self.jira.update_issue(&params.issue_key, fields).await?;
        }

        if let Some(transition) = transition {
            info!(
                "Moving {} via transition '{}' (id: {})",
                params.issue_key, transition.name, transition.id
            );
            self.jira
                .transition_issue(&params.issue_key, &transition.id)
                .await?;
        }

        let issue = self.jira.issue(&params.issue_key, None).await?;
        Ok(strip_nulls(issue))
    }
}
