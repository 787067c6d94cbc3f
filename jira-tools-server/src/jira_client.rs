//! JIRA client wrapper around gouqi
//!
//! [`JiraApi`] names the primitive remote calls the tools are built on, so the
//! operations can run against a test double. [`JiraClient`] implements it on
//! top of gouqi's raw REST helpers, bounding every call by the configured
//! request timeout.

use crate::config::JiraConfig;
use crate::error::{JiraMcpError, JiraMcpResult};
use crate::models::IssueTransition;
use async_trait::async_trait;
use gouqi::r#async::Jira;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};
use url::form_urlencoded;

/// Primitive operations against the remote Jira service
#[async_trait]
pub trait JiraApi: Send + Sync {
    /// Base URL of the Jira instance, without trailing slash
    fn base_url(&self) -> &str;

    /// Fetch an issue, optionally restricted to a comma-separated field list
    async fn issue(&self, issue_key: &str, fields: Option<&str>) -> JiraMcpResult<Value>;

    /// Page through the issues of an agile board
    async fn board_issues(
        &self,
        board_id: &str,
        jql: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value>;

    /// Page through all issues of a project, ordered by key
    async fn project_issues(
        &self,
        project_key: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value>;

    /// Run a JQL search; `None` leaves field selection and page size to the server
    async fn jql(
        &self,
        jql: &str,
        fields: Option<&str>,
        limit: Option<u32>,
    ) -> JiraMcpResult<Value>;

    async fn issue_comments(&self, issue_key: &str) -> JiraMcpResult<Value>;

    async fn add_comment(&self, issue_key: &str, body: &str) -> JiraMcpResult<Value>;

    /// Create an issue from a complete `fields` map
    async fn create_issue(&self, fields: Map<String, Value>) -> JiraMcpResult<Value>;

    /// Overwrite the given fields of an issue
    async fn update_issue(
        &self,
        issue_key: &str,
        fields: Map<String, Value>,
    ) -> JiraMcpResult<()>;

    /// Transitions available from the issue's current status
    async fn issue_transitions(&self, issue_key: &str) -> JiraMcpResult<Vec<IssueTransition>>;

    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> JiraMcpResult<()>;

    /// All projects visible to the authenticated user
    async fn projects(&self) -> JiraMcpResult<Value>;

    /// The authenticated user
    async fn current_user(&self) -> JiraMcpResult<Value>;
}

/// Transition list as returned by `/issue/{key}/transitions`
#[derive(Debug, Deserialize)]
struct TransitionOptions {
    transitions: Vec<IssueTransition>,
}

#[derive(Debug, Serialize)]
struct TransitionTrigger<'a> {
    transition: TransitionRef<'a>,
}

#[derive(Debug, Serialize)]
struct TransitionRef<'a> {
    id: &'a str,
}

/// Build an encoded query string from key/value pairs
fn query_string(pairs: &[(&str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

/// Map a gouqi error, naming the resource when Jira answers 404 or 403
fn classify(err: gouqi::Error, resource: &str, key: &str) -> JiraMcpError {
    match err {
        gouqi::Error::NotFound => JiraMcpError::not_found(resource, key),
        gouqi::Error::Fault { code, .. } if code == StatusCode::FORBIDDEN => {
            JiraMcpError::permission(format!("Access to {} {} denied", resource, key))
        }
        other => JiraMcpError::from(other),
    }
}

/// Check a key or id before it is placed in a REST path, rejecting anything
/// that could change the request target
fn path_segment<'a>(parameter: &str, value: &'a str) -> JiraMcpResult<&'a str> {
    if value.trim().is_empty() {
        return Err(JiraMcpError::invalid_param(
            parameter,
            format!("{} is required", parameter),
        ));
    }

    let forbidden = |c: char| {
        matches!(c, '/' | '?' | '#' | '%' | '\\') || c.is_whitespace() || c.is_control()
    };
    if let Some(c) = value.chars().find(|c| forbidden(*c)) {
        return Err(JiraMcpError::invalid_param(
            parameter,
            format!("'{}' contains {:?}, which is not allowed", value, c),
        ));
    }
    Ok(value)
}

/// JIRA client backed by gouqi
#[derive(Debug, Clone)]
pub struct JiraClient {
    client: Arc<Jira>,
    config: Arc<JiraConfig>,
}

impl JiraClient {
    /// Create a new JIRA client with the given configuration and check the connection
    #[instrument(skip_all)]
    pub async fn new(config: Arc<JiraConfig>) -> JiraMcpResult<Self> {
        info!("Initializing JIRA client for URL: {}", config.jira_url);

        let credentials = config.to_gouqi_credentials();
        let client = Jira::new(config.base_url(), credentials).map_err(JiraMcpError::from)?;

        let jira_client = Self {
            client: Arc::new(client),
            config,
        };

        jira_client.test_connection().await?;

        info!("JIRA client initialized successfully");
        Ok(jira_client)
    }

    #[instrument(skip_all)]
    async fn test_connection(&self) -> JiraMcpResult<()> {
        debug!("Testing JIRA connection");

        match self.current_user().await {
            Ok(user) => {
                info!(
                    "Connection test successful, authenticated as: {}",
                    user["displayName"].as_str().unwrap_or("unknown")
                );
                Ok(())
            }
            Err(e) => {
                error!("Connection test failed: {}", e);
                Err(e)
            }
        }
    }

    fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_seconds)
    }

    /// Await a gouqi call under the request timeout
    async fn call<T, F>(
        &self,
        what: &str,
        resource: &str,
        key: &str,
        request: F,
    ) -> JiraMcpResult<T>
    where
        F: Future<Output = Result<T, gouqi::Error>>,
    {
        timeout(self.timeout_duration(), request)
            .await
            .map_err(|_| JiraMcpError::network(format!("Timeout {}", what)))?
            .map_err(|e| classify(e, resource, key))
    }

    async fn search(&self, jql: &str, pairs: Vec<(&str, String)>) -> JiraMcpResult<Value> {
        let mut query = vec![("jql", jql.to_string())];
        query.extend(pairs);
        let endpoint = format!("/search?{}", query_string(&query));

        debug!("Searching issues with JQL: '{}'", jql);
        self.call("during search", "search", jql, self.client.get("api", &endpoint))
            .await
    }
}

#[async_trait]
impl JiraApi for JiraClient {
    fn base_url(&self) -> &str {
        self.config.base_url()
    }

    #[instrument(skip(self))]
    async fn issue(&self, issue_key: &str, fields: Option<&str>) -> JiraMcpResult<Value> {
        let key = path_segment("issue_key", issue_key)?;
        let endpoint = match fields {
            Some(fields) => format!(
                "/issue/{}?{}",
                key,
                query_string(&[("fields", fields.to_string())])
            ),
            None => format!("/issue/{}", key),
        };

        debug!("Fetching issue {}", issue_key);
        self.call(
            &format!("getting issue {}", issue_key),
            "issue",
            issue_key,
            self.client.get("api", &endpoint),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn board_issues(
        &self,
        board_id: &str,
        jql: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value> {
        let mut pairs = vec![
            ("fields", fields.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", limit.to_string()),
        ];
        if !jql.is_empty() {
            pairs.push(("jql", jql.to_string()));
        }
        let endpoint = format!(
            "/board/{}/issue?{}",
            path_segment("board_id", board_id)?,
            query_string(&pairs)
        );

        debug!("Fetching issues for board {}", board_id);
        self.call(
            &format!("getting issues for board {}", board_id),
            "board",
            board_id,
            self.client.get("agile", &endpoint),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn project_issues(
        &self,
        project_key: &str,
        fields: &str,
        start_at: u32,
        limit: u32,
    ) -> JiraMcpResult<Value> {
        let jql = format!("project = \"{}\" ORDER BY key", project_key);
        self.search(
            &jql,
            vec![
                ("fields", fields.to_string()),
                ("startAt", start_at.to_string()),
                ("maxResults", limit.to_string()),
            ],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn jql(
        &self,
        jql: &str,
        fields: Option<&str>,
        limit: Option<u32>,
    ) -> JiraMcpResult<Value> {
        let mut pairs = Vec::new();
        if let Some(fields) = fields {
            pairs.push(("fields", fields.to_string()));
        }
        if let Some(limit) = limit {
            pairs.push(("maxResults", limit.to_string()));
        }
        self.search(jql, pairs).await
    }

    #[instrument(skip(self))]
    async fn issue_comments(&self, issue_key: &str) -> JiraMcpResult<Value> {
        let endpoint = format!("/issue/{}/comment", path_segment("issue_key", issue_key)?);
        self.call(
            &format!("getting comments for issue {}", issue_key),
            "issue",
            issue_key,
            self.client.get("api", &endpoint),
        )
        .await
    }

    #[instrument(skip(self, body), fields(body_length = body.len()))]
    async fn add_comment(&self, issue_key: &str, body: &str) -> JiraMcpResult<Value> {
        info!("Adding comment to issue: {}", issue_key);

        let endpoint = format!("/issue/{}/comment", path_segment("issue_key", issue_key)?);
        let comment = self
            .call(
                &format!("adding comment to issue {}", issue_key),
                "issue",
                issue_key,
                self.client
                    .post::<Value, _>("api", &endpoint, json!({ "body": body })),
            )
            .await?;

        info!("Successfully added comment to issue {}", issue_key);
        Ok(comment)
    }

    #[instrument(skip(self, fields))]
    async fn create_issue(&self, fields: Map<String, Value>) -> JiraMcpResult<Value> {
        let project = fields
            .get("project")
            .and_then(|p| p.get("key"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!("Creating issue in project {}", project);

        let created: Value = self
            .call(
                &format!("creating issue in project {}", project),
                "project",
                &project,
                self.client
                    .post::<Value, _>("api", "/issue", json!({ "fields": fields })),
            )
            .await?;

        info!(
            "Successfully created issue: {}",
            created["key"].as_str().unwrap_or("<unknown>")
        );
        Ok(created)
    }

    #[instrument(skip(self, fields))]
    async fn update_issue(
        &self,
        issue_key: &str,
        fields: Map<String, Value>,
    ) -> JiraMcpResult<()> {
        let field_count = fields.len();
        let endpoint = format!("/issue/{}", path_segment("issue_key", issue_key)?);
        self.call(
            &format!("updating issue {}", issue_key),
            "issue",
            issue_key,
            self.client
                .put::<(), _>("api", &endpoint, json!({ "fields": fields })),
        )
        .await?;

        info!("Updated {} field(s) of issue {}", field_count, issue_key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn issue_transitions(&self, issue_key: &str) -> JiraMcpResult<Vec<IssueTransition>> {
        let endpoint = format!(
            "/issue/{}/transitions",
            path_segment("issue_key", issue_key)?
        );
        let options: TransitionOptions = self
            .call(
                &format!("getting transitions for issue {}", issue_key),
                "issue",
                issue_key,
                self.client.get("api", &endpoint),
            )
            .await?;

        debug!(
            "Issue {} has {} available transitions",
            issue_key,
            options.transitions.len()
        );
        Ok(options.transitions)
    }

    #[instrument(skip(self))]
    async fn transition_issue(&self, issue_key: &str, transition_id: &str) -> JiraMcpResult<()> {
        let endpoint = format!(
            "/issue/{}/transitions",
            path_segment("issue_key", issue_key)?
        );
        let trigger = TransitionTrigger {
            transition: TransitionRef { id: transition_id },
        };

        // 204 No Content arrives as null
        self.call(
            &format!("transitioning issue {}", issue_key),
            "issue",
            issue_key,
            self.client.post::<Value, _>("api", &endpoint, trigger),
        )
        .await?;

        info!(
            "Transitioned issue {} with transition {}",
            issue_key, transition_id
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn projects(&self) -> JiraMcpResult<Value> {
        self.call(
            "listing projects",
            "projects",
            "all",
            self.client.get("api", "/project"),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn current_user(&self) -> JiraMcpResult<Value> {
        debug!("Fetching current user information");
        self.call(
            "getting current user",
            "user",
            "myself",
            self.client.get("api", "/myself"),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolOutcome;
    use std::collections::BTreeMap;

    fn fault(code: StatusCode, field: &str, message: &str) -> gouqi::Error {
        gouqi::Error::Fault {
            code,
            errors: gouqi::Errors {
                error_messages: Vec::new(),
                errors: BTreeMap::from([(field.to_string(), message.to_string())]),
                error: None,
            },
        }
    }

    #[test]
    fn test_query_string_encodes_jql() {
        let query = query_string(&[
            ("jql", "project = \"ENG\" ORDER BY key".to_string()),
            ("fields", "key,summary".to_string()),
        ]);
        assert_eq!(
            query,
            "jql=project+%3D+%22ENG%22+ORDER+BY+key&fields=key%2Csummary"
        );
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(gouqi::Error::NotFound, "issue", "ENG-404");
        assert_eq!(err.category(), "not_found");
        assert!(err.to_string().contains("ENG-404"));
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify(gouqi::Error::Unauthorized, "issue", "ENG-1");
        assert_eq!(err.category(), "authentication");
    }

    #[test]
    fn test_classify_forbidden_fault() {
        let err = classify(
            fault(StatusCode::FORBIDDEN, "permission", "No browse permission"),
            "issue",
            "ENG-1",
        );
        assert_eq!(err.category(), "permission");
        assert!(err.to_string().contains("ENG-1"));
    }

    #[test]
    fn test_classify_keeps_field_error_mentioning_404() {
        let err = classify(
            fault(
                StatusCode::BAD_REQUEST,
                "customfield_10404",
                "Field 'customfield_10404' cannot be set. It is not on the appropriate screen, or unknown.",
            ),
            "project",
            "ENG",
        );
        assert_eq!(err.category(), "internal");

        let outcome: ToolOutcome<Value> = Err(err).into();
        let message = outcome.error_message().unwrap();
        assert!(message.contains("cannot be set"), "got: {}", message);
        assert!(!message.contains("Not found"), "got: {}", message);
    }

    #[test]
    fn test_classify_keeps_jql_error_mentioning_403() {
        let err = classify(
            fault(
                StatusCode::BAD_REQUEST,
                "jql",
                "The value 'ENG403' does not exist for the field 'project'.",
            ),
            "search",
            "project = ENG403",
        );
        assert_eq!(err.category(), "internal");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_path_segment_accepts_keys_and_ids() {
        assert_eq!(path_segment("issue_key", "ENG-123").unwrap(), "ENG-123");
        assert_eq!(path_segment("board_id", "42").unwrap(), "42");
    }

    #[test]
    fn test_path_segment_rejects_request_rewrites() {
        for value in ["ENG-1/comment", "ENG-1?expand=all", "ENG-1#x", "ENG 1", "%2e%2e", ""] {
            let err = path_segment("issue_key", value).unwrap_err();
            assert_eq!(err.category(), "invalid_parameter", "value: {:?}", value);
        }
    }
}
