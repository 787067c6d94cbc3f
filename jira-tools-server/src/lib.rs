//! Jira Tools Server Library
//!
//! Exposes a set of Jira issue and project operations as Model Context
//! Protocol (MCP) tools. Each tool forwards its parameters to the Jira REST
//! API and returns the response, shaped where noted:
//!
//! - **Listings** (`get_issues_for_board`, `get_issues_for_project`) return the
//!   raw page as pretty-printed JSON text.
//! - **Single issues** come back with every null field removed.
//! - **Searches** (`get_issues`, `search_issues_by_text`) are reduced to key,
//!   summary and status.
//! - **Writes** (`add_comment`, `create_issue`, `update_issue`) never raise;
//!   failures are returned as `{"error": "..."}`.

use crate::config::JiraConfig;
use crate::error::{JiraMcpError, JiraMcpResult, ToolOutcome};
use crate::jira_client::{JiraApi, JiraClient};
use crate::models::{IssueSummary, JiraIssue, LinkedIssue};
use crate::tools::{
    AddCommentParams, CreateIssueParams, GetIssuesForBoardParams, GetIssuesForProjectParams,
    GetIssuesParams, GetLinkedIssuesParams, IssueKeyParams, IssueTools, ProjectKeyParams,
    ProjectTools, SearchIssuesByTextParams, UpdateIssueParams,
};

use pulseengine_mcp_macros::{mcp_server, mcp_tools};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

// Re-export modules for external use
pub mod config;
pub mod error;
pub mod jira_client;
pub mod models;
pub mod shaping;
pub mod tools;

/// Jira Tools Server
///
/// Registers the issue and project operations as MCP tools.
/// Uses the #[mcp_server] macro for automatic MCP infrastructure generation.
#[mcp_server(
    name = "Jira Tools Server",
    version = "0.1.0",
    description = "Jira issue and project operations exposed as MCP tools",
    auth = "disabled"
)]
#[derive(Clone)]
pub struct JiraToolsServer {
    /// Remote client shared by all tools
    jira_client: Arc<dyn JiraApi>,

    issue_tools: Arc<IssueTools>,
    project_tools: Arc<ProjectTools>,
}

impl Default for JiraToolsServer {
    fn default() -> Self {
        // Required by the server macro; a client needs configuration and a live connection
        panic!("JiraToolsServer cannot be created with default(). Use JiraToolsServer::new() instead.")
    }
}

impl JiraToolsServer {
    /// Create a server from the environment and configuration files
    #[instrument]
    pub async fn new() -> JiraMcpResult<Self> {
        info!("Initializing Jira Tools Server");

        let config =
            JiraConfig::load().map_err(|e| JiraMcpError::config(format!("{:#}", e)))?;
        info!("Configuration loaded successfully");

        Self::with_config(config).await
    }

    /// Create a server with an explicit configuration, connecting to Jira
    #[instrument(skip(config))]
    pub async fn with_config(config: JiraConfig) -> JiraMcpResult<Self> {
        config
            .validate()
            .map_err(|e| JiraMcpError::config(format!("{:#}", e)))?;
        let jira_client = JiraClient::new(Arc::new(config)).await?;
        info!("JIRA client initialized");

        Ok(Self::with_client(Arc::new(jira_client)))
    }

    /// Create a server over any [`JiraApi`] implementation
    pub fn with_client(jira_client: Arc<dyn JiraApi>) -> Self {
        Self {
            issue_tools: Arc::new(IssueTools::new(Arc::clone(&jira_client))),
            project_tools: Arc::new(ProjectTools::new(Arc::clone(&jira_client))),
            jira_client,
        }
    }
}

/// Log a failed tool call and hand it to the MCP layer
fn tool_error(tool: &str, e: JiraMcpError) -> anyhow::Error {
    error!(category = e.category(), "{} failed: {}", tool, e);
    anyhow::anyhow!(e)
}

/// All public methods in this impl block become MCP tools automatically
#[mcp_tools]
impl JiraToolsServer {
    /// Retrieve issues from a Jira agile board
    ///
    /// Returns the raw Jira page as pretty-printed JSON text.
    ///
    /// # Examples
    /// - First page of a board: `{"board_id": "42"}`
    /// - Open bugs on a board: `{"board_id": "42", "jql": "issuetype = Bug AND resolution = Unresolved"}`
    #[instrument(skip(self))]
    pub async fn get_issues_for_board(
        &self,
        params: GetIssuesForBoardParams,
    ) -> anyhow::Result<String> {
        self.issue_tools
            .get_issues_for_board(params)
            .await
            .map_err(|e| tool_error("get_issues_for_board", e))
    }

    /// Retrieve issues from a Jira project, ordered by key
    ///
    /// Returns the raw Jira page as pretty-printed JSON text.
    ///
    /// # Examples
    /// - `{"project_key": "ENG", "limit": 50}`
    #[instrument(skip(self))]
    pub async fn get_issues_for_project(
        &self,
        params: GetIssuesForProjectParams,
    ) -> anyhow::Result<String> {
        self.issue_tools
            .get_issues_for_project(params)
            .await
            .map_err(|e| tool_error("get_issues_for_project", e))
    }

    /// Filter issues with JQL, returning key, summary and status of each
    ///
    /// # Examples
    /// - `{"jql": "project = ENG AND status = \"In Progress\""}`
    #[instrument(skip(self))]
    pub async fn get_issues(&self, params: GetIssuesParams) -> anyhow::Result<Vec<IssueSummary>> {
        self.issue_tools
            .get_issues(params)
            .await
            .map_err(|e| tool_error("get_issues", e))
    }

    /// Retrieve a single Jira issue with all null fields removed
    ///
    /// # Examples
    /// - `{"issue_key": "ENG-123"}`
    #[instrument(skip(self))]
    pub async fn get_issue(&self, params: IssueKeyParams) -> anyhow::Result<Value> {
        self.issue_tools
            .get_issue(params)
            .await
            .map_err(|e| tool_error("get_issue", e))
    }

    /// Retrieve a compact, always fully populated overview of a Jira issue
    ///
    /// Missing values are reported as "Unknown", "Unassigned" or empty strings
    /// instead of being left out.
    #[instrument(skip(self))]
    pub async fn get_issue_overview(&self, params: IssueKeyParams) -> anyhow::Result<JiraIssue> {
        self.issue_tools
            .get_issue_overview(params)
            .await
            .map_err(|e| tool_error("get_issue_overview", e))
    }

    /// Retrieve the comments of a Jira issue
    #[instrument(skip(self))]
    pub async fn get_issue_comments(&self, params: IssueKeyParams) -> anyhow::Result<Value> {
        self.issue_tools
            .get_issue_comments(params)
            .await
            .map_err(|e| tool_error("get_issue_comments", e))
    }

    /// Add a comment to a Jira issue
    ///
    /// Returns the created comment, or `{"error": "..."}` if Jira rejected it.
    ///
    /// # Examples
    /// - `{"issue_key": "ENG-123", "comment": "Reproduced on 2.4.1"}`
    #[instrument(skip(self))]
    pub async fn add_comment(&self, params: AddCommentParams) -> anyhow::Result<ToolOutcome<Value>> {
        Ok(self.issue_tools.add_comment(params).await)
    }

    /// Get issues linked to the specified issue
    ///
    /// Each result holds the other issue's key and summary and the link phrase
    /// as seen from the specified issue.
    ///
    /// # Examples
    /// - All links: `{"issue_key": "ENG-123"}`
    /// - Only blockers: `{"issue_key": "ENG-123", "relationship_type": "is blocked by"}`
    #[instrument(skip(self))]
    pub async fn get_linked_issues(
        &self,
        params: GetLinkedIssuesParams,
    ) -> anyhow::Result<Vec<LinkedIssue>> {
        self.issue_tools
            .get_linked_issues(params)
            .await
            .map_err(|e| tool_error("get_linked_issues", e))
    }

    /// Search for issues containing text in their summary, description or comments
    ///
    /// # Examples
    /// - `{"text": "NullPointerException in SaveHandler", "max_results": 5}`
    #[instrument(skip(self))]
    pub async fn search_issues_by_text(
        &self,
        params: SearchIssuesByTextParams,
    ) -> anyhow::Result<Vec<IssueSummary>> {
        self.issue_tools
            .search_issues_by_text(params)
            .await
            .map_err(|e| tool_error("search_issues_by_text", e))
    }

    /// Create a Jira issue
    ///
    /// Returns the created issue reference, or `{"error": "..."}` on failure.
    ///
    /// # Examples
    /// - `{"project_key": "ENG", "issue_type": "Bug", "summary": "Crash on save"}`
    /// - `{"project_key": "ENG", "issue_type": "Task", "summary": "Docs", "labels": ["docs"], "extra_fields": {"customfield_10016": 3}}`
    #[instrument(skip(self))]
    pub async fn create_issue(
        &self,
        params: CreateIssueParams,
    ) -> anyhow::Result<ToolOutcome<Value>> {
        Ok(self.issue_tools.create_issue(params).await)
    }

    /// Update fields and/or the status of a Jira issue
    ///
    /// A status change runs the workflow transition with that name. Returns the
    /// updated issue, or `{"error": "..."}` on failure.
    ///
    /// # Examples
    /// - `{"issue_key": "ENG-123", "status": "In Progress"}`
    /// - `{"issue_key": "ENG-123", "summary": "Crash on save (Windows only)", "priority": "High"}`
    #[instrument(skip(self))]
    pub async fn update_issue(
        &self,
        params: UpdateIssueParams,
    ) -> anyhow::Result<ToolOutcome<Value>> {
        Ok(self.issue_tools.update_issue(params).await)
    }

    /// Retrieve all Jira projects
    #[instrument(skip(self))]
    pub async fn get_projects(&self) -> anyhow::Result<Value> {
        self.project_tools
            .get_projects()
            .await
            .map_err(|e| tool_error("get_projects", e))
    }

    /// Count all Jira projects
    #[instrument(skip(self))]
    pub async fn get_project_count(&self) -> anyhow::Result<usize> {
        self.project_tools
            .get_projects_count()
            .await
            .map_err(|e| tool_error("get_project_count", e))
    }

    /// Count the issues in a Jira project
    ///
    /// # Examples
    /// - `{"project_key": "ENG"}`
    #[instrument(skip(self))]
    pub async fn get_issues_count_for_project(
        &self,
        params: ProjectKeyParams,
    ) -> anyhow::Result<u64> {
        self.project_tools
            .get_issue_count_for_project(params)
            .await
            .map_err(|e| tool_error("get_issues_count_for_project", e))
    }

    /// Test JIRA connection and authentication
    ///
    /// Reports the authenticated user, or what went wrong.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> anyhow::Result<String> {
        info!("Testing JIRA connection");

        match self.jira_client.current_user().await {
            Ok(user) => {
                let display_name = user["displayName"].as_str().unwrap_or("Unknown");
                info!("Connection test successful for user: {}", display_name);
                Ok(format!(
                    "✅ Connection successful!\n\
                     JIRA URL: {}\n\
                     Authenticated as: {}",
                    self.jira_client.base_url(),
                    display_name
                ))
            }
            Err(e) => {
                error!("Connection test failed: {}", e);
                // Returned as success so the caller sees the diagnosis
                Ok(format!(
                    "❌ Connection failed!\n\
                     JIRA URL: {}\n\
                     Error: {}\n\
                     \n\
                     Please check:\n\
                     - JIRA URL is correct and accessible\n\
                     - The access token is valid\n\
                     - Network connectivity to JIRA instance",
                    self.jira_client.base_url(),
                    e
                ))
            }
        }
    }
}
