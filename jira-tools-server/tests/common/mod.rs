//! Common utilities for Jira tools integration tests
//!
//! [`MockJira`] stands in for the remote service: it answers from canned
//! payloads and records every call so tests can check what would have been sent.
#![allow(dead_code)]

use async_trait::async_trait;
use jira_tools_server::error::{JiraMcpError, JiraMcpResult};
use jira_tools_server::jira_client::JiraApi;
use jira_tools_server::models::IssueTransition;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://jira.example.com";

/// A remote call as seen by the test double
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Issue {
        key: String,
        fields: Option<String>,
    },
    BoardIssues {
        board_id: String,
        jql: String,
        fields: String,
        start_at: u32,
        limit: u32,
    },
    ProjectIssues {
        project_key: String,
        fields: String,
        start_at: u32,
        limit: u32,
    },
    Jql {
        jql: String,
        fields: Option<String>,
        limit: Option<u32>,
    },
    IssueComments {
        key: String,
    },
    AddComment {
        key: String,
        body: String,
    },
    CreateIssue {
        fields: Map<String, Value>,
    },
    UpdateIssue {
        key: String,
        fields: Map<String, Value>,
    },
    IssueTransitions {
        key: String,
    },
    TransitionIssue {
        key: String,
        transition_id: String,
    },
    Projects,
    CurrentUser,
}

/// Recording test double for [`JiraApi`]
#[derive(Default)]
pub struct MockJira {
    issues: HashMap<String, Value>,
    search_response: Value,
    board_response: Value,
    project_issues_response: Value,
    comments: Value,
    created: Value,
    transitions: Vec<IssueTransition>,
    projects: Value,
    failing: HashSet<&'static str>,
    calls: Mutex<Vec<Call>>,
}

impl MockJira {
    pub fn new() -> Self {
        Self {
            projects: json!([]),
            search_response: json!({"startAt": 0, "maxResults": 50, "total": 0, "issues": []}),
            ..Default::default()
        }
    }

    pub fn with_issue(mut self, issue: Value) -> Self {
        let key = issue["key"].as_str().unwrap_or_default().to_string();
        self.issues.insert(key, issue);
        self
    }

    pub fn with_search_response(mut self, response: Value) -> Self {
        self.search_response = response;
        self
    }

    pub fn with_board_response(mut self, response: Value) -> Self {
        self.board_response = response;
        self
    }

    pub fn with_project_issues_response(mut self, response: Value) -> Self {
        self.project_issues_response = response;
        self
    }

    pub fn with_comments(mut self, comments: Value) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_created(mut self, created: Value) -> Self {
        self.created = created;
        self
    }

    pub fn with_transitions(mut self, transitions: &[(&str, &str)]) -> Self {
        self.transitions = transitions
            .iter()
            .map(|(id, name)| IssueTransition {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn with_projects(mut self, projects: Value) -> Self {
        self.projects = projects;
        self
    }

    /// Make the named primitive fail with a network error
    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, operation: &'static str, call: Call) -> JiraMcpResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(operation) {
            return Err(JiraMcpError::network(format!("{} refused", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl JiraApi for MockJira {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn issue(&self, issue_key: &str, fields: Option<&str>) -> JiraMcpResult<Value> {
        self.record(
            "issue",
            Call::Issue {
                key: issue_key.to_string(),
                fields: fields.map(str::to_string),
            },
        )?;
        self.issues
            .get(issue_key)
            .cloned()
            .ok_or_else(|| JiraMcpError::not_found("issue", issue_key))
    }

    async fn board_issues(
        &self,
        board_id: &str,
        jql: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value> {
        self.record(
            "board_issues",
            Call::BoardIssues {
                board_id: board_id.to_string(),
                jql: jql.to_string(),
                fields: fields.to_string(),
                start_at,
                limit,
            },
        )?;
        Ok(self.board_response.clone())
    }

    async fn project_issues(
        &self,
        project_key: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value> {
        self.record(
            "project_issues",
            Call::ProjectIssues {
                project_key: project_key.to_string(),
                fields: fields.to_string(),
                start_at,
                limit,
            },
        )?;
        Ok(self.project_issues_response.clone())
    }

    async fn jql(
        &self,
        jql: &str,
        fields: Option<&str>,
        limit: Option<u32>,
    ) -> JiraMcpResult<Value> {
        self.record(
            "jql",
            Call::Jql {
                jql: jql.to_string(),
                fields: fields.map(str::to_string),
                limit,
            },
        )?;
        Ok(self.search_response.clone())
    }

    async fn issue_comments(&self, issue_key: &str) -> JiraMcpResult<Value> {
        self.record(
            "issue_comments",
            Call::IssueComments {
                key: issue_key.to_string(),
            },
        )?;
        Ok(self.comments.clone())
    }

    async fn add_comment(&self, issue_key: &str, body: &str) -> JiraMcpResult<Value> {
        self.record(
            "add_comment",
            Call::AddComment {
                key: issue_key.to_string(),
                body: body.to_string(),
            },
        )?;
        Ok(json!({"id": "10001", "body": body, "visibility": null}))
    }

    async fn create_issue(&self, fields: Map<String, Value>) -> JiraMcpResult<Value> {
        self.record("create_issue", Call::CreateIssue { fields })?;
        Ok(self.created.clone())
    }

    async fn update_issue(
        &self,
        issue_key: &str,
        fields: Map<String, Value>,
    ) -> JiraMcpResult<()> {
        self.record(
            "update_issue",
            Call::UpdateIssue {
                key: issue_key.to_string(),
                fields,
            },
        )
    }

    async fn issue_transitions(&self, issue_key: &str) -> JiraMcpResult<Vec<IssueTransition>> {
        self.record(
            "issue_transitions",
            Call::IssueTransitions {
                key: issue_key.to_string(),
            },
        )?;
        Ok(self.transitions.clone())
    }

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> JiraMcpResult<()> {
        self.record(
            "transition_issue",
            Call::TransitionIssue {
                key: issue_key.to_string(),
                transition_id: transition_id.to_string(),
            },
        )
    }

    async fn projects(&self) -> JiraMcpResult<Value> {
        self.record("projects", Call::Projects)?;
        Ok(self.projects.clone())
    }

    async fn current_user(&self) -> JiraMcpResult<Value> {
        self.record("current_user", Call::CurrentUser)?;
        Ok(json!({"name": "jdoe", "displayName": "Jane Doe", "active": true}))
    }
}

/// A realistic issue payload with a few nulls sprinkled in
pub fn sample_issue(key: &str) -> Value {
    json!({
        "id": "10042",
        "key": key,
        "self": format!("{}/rest/api/2/issue/10042", BASE_URL),
        "fields": {
            "summary": "Crash on save",
            "description": null,
            "status": {"id": "3", "name": "In Progress", "statusCategory": {"id": 4, "key": "indeterminate", "name": "In Progress", "colorName": "yellow"}},
            "assignee": null,
            "reporter": {"name": "jdoe", "displayName": "Jane Doe", "emailAddress": "jane@example.com", "active": true},
            "labels": ["crash", null],
            "priority": {"id": "2", "name": "High"},
            "issuetype": {"id": "1", "name": "Bug"},
            "created": "2024-03-01T09:00:00.000+0000",
            "updated": "2024-03-02T09:00:00.000+0000",
            "issuelinks": [
                {
                    "id": "500",
                    "type": {"name": "Blocks", "inward": "is blocked by", "outward": "blocks"},
                    "outwardIssue": {"key": "ENG-2", "fields": {"summary": "Release 2.5"}}
                },
                {
                    "id": "501",
                    "type": {"name": "Duplicate", "inward": "is duplicated by", "outward": "duplicates"},
                    "inwardIssue": {"key": "ENG-9", "fields": {"summary": "Saving crashes"}}
                }
            ]
        }
    })
}

/// Search response with one issue carrying a status and one without
pub fn sample_search_response() -> Value {
    json!({
        "startAt": 0,
        "maxResults": 50,
        "total": 42,
        "issues": [
            {"id": "1", "key": "ENG-1", "fields": {"summary": "Crash on save", "status": {"id": "3", "name": "In Progress"}}},
            {"id": "2", "key": "ENG-2", "fields": {"summary": "Release 2.5"}}
        ]
    })
}
