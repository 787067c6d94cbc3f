/// Integration tests for the MCP tool surface of the server
mod common;

use common::{sample_issue, Call, MockJira, BASE_URL};
use jira_tools_server::tools::{AddCommentParams, IssueKeyParams, UpdateIssueParams};
use jira_tools_server::JiraToolsServer;
use serde_json::json;

#[tokio::test]
async fn test_read_tool_error_is_raised() {
    let server = JiraToolsServer::with_client(MockJira::new().into_arc());

    let err = server
        .get_issue(IssueKeyParams {
            issue_key: "ENG-404".to_string(),
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ENG-404"), "got: {}", err);
}

#[tokio::test]
async fn test_write_tool_error_is_returned_as_data() {
    let mock = MockJira::new().failing("add_comment").into_arc();
    let server = JiraToolsServer::with_client(mock);

    let outcome = server
        .add_comment(AddCommentParams {
            issue_key: "ENG-1".to_string(),
            comment: "hello".to_string(),
        })
        .await
        .expect("write tools never raise");

    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        json!({"error": "Network error: add_comment refused"})
    );
}

#[tokio::test]
async fn test_update_tool_returns_refreshed_issue() {
    let mock = MockJira::new()
        .with_issue(sample_issue("ENG-1"))
        .with_transitions(&[("31", "Done")])
        .into_arc();
    let server = JiraToolsServer::with_client(mock.clone());

    let outcome = server
        .update_issue(UpdateIssueParams {
            issue_key: "ENG-1".to_string(),
            status: Some("Done".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let issue = serde_json::to_value(&outcome).unwrap();
    assert_eq!(issue["key"], "ENG-1");
    assert!(mock.calls().contains(&Call::TransitionIssue {
        key: "ENG-1".to_string(),
        transition_id: "31".to_string(),
    }));
}

#[tokio::test]
async fn test_project_count_tool() {
    let mock = MockJira::new()
        .with_projects(json!([{"key": "ENG"}]))
        .into_arc();
    let server = JiraToolsServer::with_client(mock);

    assert_eq!(server.get_project_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_connection_reports_user() {
    let server = JiraToolsServer::with_client(MockJira::new().into_arc());

    let report = server.test_connection().await.unwrap();
    assert!(report.contains("Connection successful"));
    assert!(report.contains(BASE_URL));
    assert!(report.contains("Jane Doe"));
}

#[tokio::test]
async fn test_connection_failure_is_a_report() {
    let server =
        JiraToolsServer::with_client(MockJira::new().failing("current_user").into_arc());

    let report = server.test_connection().await.unwrap();
    assert!(report.contains("Connection failed"));
    assert!(report.contains("current_user refused"));
}
