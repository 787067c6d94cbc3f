//! Response shaping applied between the Jira client and the tools
//!
//! Pure functions over raw JSON: null stripping, the key/summary/status
//! projection, free-text JQL assembly and issue-link resolution.

use crate::models::{IssueSummary, LinkedIssue};
use serde_json::Value;

const DEFAULT_RELATIONSHIP: &str = "relates to";

/// Recursively drop null object entries and null array elements
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(strip_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// Reduce a search response to key, summary and status name per issue
pub fn summarize_issues(response: &Value) -> Vec<IssueSummary> {
    response
        .get("issues")
        .and_then(Value::as_array)
        .map(|issues| issues.iter().map(summarize_issue).collect())
        .unwrap_or_default()
}

fn summarize_issue(issue: &Value) -> IssueSummary {
    let fields = issue.get("fields");
    IssueSummary {
        key: issue.get("key").and_then(Value::as_str).map(str::to_string),
        summary: fields
            .and_then(|f| f.get("summary"))
            .and_then(Value::as_str)
            .map(str::to_string),
        status: fields
            .and_then(|f| f.get("status"))
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Blank out characters that would break a quoted JQL string.
///
/// Not an escape: `"`, `~` and `\` each become a space.
pub fn sanitize_search_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '"' | '~' | '\\' => ' ',
            c => c,
        })
        .collect()
}

/// JQL matching `text` against full text, summary, description and comments
pub fn text_search_jql(text: &str) -> String {
    let clean = sanitize_search_text(text);
    ["text", "summary", "description", "comment"]
        .iter()
        .map(|field| format!("{} ~ \"{}\"", field, clean))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Resolve the links on an issue fetched with the `issuelinks` field.
///
/// Each link points either outward (this issue is the source) or inward (this
/// issue is the target); anything else is skipped. A non-empty
/// `relationship_filter` keeps only links whose phrase matches it ignoring case.
pub fn extract_linked_issues(
    issue: &Value,
    relationship_filter: Option<&str>,
) -> Vec<LinkedIssue> {
    let Some(links) = issue
        .get("fields")
        .and_then(|f| f.get("issuelinks"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let filter = relationship_filter
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    links
        .iter()
        .filter_map(resolve_link)
        .filter(|link| {
            filter
                .as_ref()
                .map_or(true, |wanted| link.relationship.to_lowercase() == *wanted)
        })
        .collect()
}

fn resolve_link(link: &Value) -> Option<LinkedIssue> {
    let outward = link.get("outwardIssue").filter(|v| v.is_object());
    let inward = link.get("inwardIssue").filter(|v| v.is_object());
    let (target, direction) = match (outward, inward) {
        (Some(target), _) => (target, "outward"),
        (None, Some(target)) => (target, "inward"),
        (None, None) => return None,
    };

    let key = target.get("key").and_then(Value::as_str)?;
    let relationship = link
        .get("type")
        .and_then(|t| t.get(direction))
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_RELATIONSHIP);
    let summary = target
        .get("fields")
        .and_then(|f| f.get("summary"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    Some(LinkedIssue {
        key: key.to_string(),
        relationship: relationship.to_string(),
        summary: summary.to_string(),
    })
}
