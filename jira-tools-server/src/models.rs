//! Typed projections of Jira payloads
//!
//! Every model is built from a raw JSON response and is always fully
//! populated: absent values fall back to sentinel defaults instead of null.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields requested when a listing call does not name its own
pub const DEFAULT_READ_FIELDS: [&str; 10] = [
    "summary",
    "description",
    "status",
    "assignee",
    "reporter",
    "labels",
    "priority",
    "created",
    "updated",
    "issuetype",
];

pub const DEFAULT_ID: &str = "0";
pub const UNKNOWN: &str = "Unknown";
pub const UNASSIGNED: &str = "Unassigned";
pub const NONE_VALUE: &str = "None";

/// Comma-separated field list, falling back to [`DEFAULT_READ_FIELDS`] when
/// none (or an empty one) was supplied
pub fn fields_or_default(fields: Option<&str>) -> String {
    match fields {
        Some(fields) if !fields.is_empty() => fields.to_string(),
        _ => DEFAULT_READ_FIELDS.join(","),
    }
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

fn str_or(value: &Value, name: &str, default: &str) -> String {
    str_field(value, name).unwrap_or_else(|| default.to_string())
}

/// Object at `name`, ignoring nulls and non-objects
fn object_at<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| v.is_object())
}

/// A Jira user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraUser {
    pub account_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub active: bool,
    pub avatar_url: Option<String>,
    pub time_zone: Option<String>,
}

impl Default for JiraUser {
    fn default() -> Self {
        Self {
            account_id: None,
            display_name: UNASSIGNED.to_string(),
            email: None,
            active: true,
            avatar_url: None,
            time_zone: None,
        }
    }
}

impl JiraUser {
    pub fn from_remote(user: &Value) -> Self {
        Self {
            // Cloud exposes accountId, Server/DC only the user name
            account_id: str_field(user, "accountId").or_else(|| str_field(user, "name")),
            display_name: str_or(user, "displayName", UNASSIGNED),
            email: str_field(user, "emailAddress"),
            active: user.get("active").and_then(Value::as_bool).unwrap_or(true),
            avatar_url: user
                .get("avatarUrls")
                .and_then(|urls| urls.get("48x48"))
                .and_then(Value::as_str)
                .map(str::to_string),
            time_zone: str_field(user, "timeZone"),
        }
    }
}

/// Category grouping of a status (To Do / In Progress / Done)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraStatusCategory {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub color_name: String,
}

impl JiraStatusCategory {
    pub fn from_remote(category: &Value) -> Self {
        Self {
            id: category.get("id").and_then(Value::as_i64).unwrap_or(0),
            key: str_or(category, "key", ""),
            name: str_or(category, "name", UNKNOWN),
            color_name: str_or(category, "colorName", ""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraStatus {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub category: Option<JiraStatusCategory>,
}

impl Default for JiraStatus {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            name: UNKNOWN.to_string(),
            description: None,
            icon_url: None,
            category: None,
        }
    }
}

impl JiraStatus {
    pub fn from_remote(status: &Value) -> Self {
        Self {
            id: str_or(status, "id", DEFAULT_ID),
            name: str_or(status, "name", UNKNOWN),
            description: str_field(status, "description"),
            icon_url: str_field(status, "iconUrl"),
            category: object_at(status, "statusCategory").map(JiraStatusCategory::from_remote),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraIssueType {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl Default for JiraIssueType {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            name: UNKNOWN.to_string(),
            description: None,
            icon_url: None,
        }
    }
}

impl JiraIssueType {
    pub fn from_remote(issue_type: &Value) -> Self {
        Self {
            id: str_or(issue_type, "id", DEFAULT_ID),
            name: str_or(issue_type, "name", UNKNOWN),
            description: str_field(issue_type, "description"),
            icon_url: str_field(issue_type, "iconUrl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraPriority {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl Default for JiraPriority {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            name: NONE_VALUE.to_string(),
            description: None,
            icon_url: None,
        }
    }
}

impl JiraPriority {
    pub fn from_remote(priority: &Value) -> Self {
        Self {
            id: str_or(priority, "id", DEFAULT_ID),
            name: str_or(priority, "name", NONE_VALUE),
            description: str_field(priority, "description"),
            icon_url: str_field(priority, "iconUrl"),
        }
    }
}

/// Fully populated overview of a single issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JiraIssue {
    pub key: String,
    pub summary: String,
    pub status: JiraStatus,
    pub assignee: JiraUser,
    pub reporter: JiraUser,
    pub created: String,
    pub updated: String,
    pub issue_type: JiraIssueType,
    pub priority: JiraPriority,
    pub url: Option<String>,
}

impl JiraIssue {
    /// Project a raw issue payload, linking it under `base_url` when the key is known
    pub fn from_remote(issue: &Value, base_url: &str) -> Self {
        let empty = Value::Null;
        let fields = object_at(issue, "fields").unwrap_or(&empty);
        let key = str_or(issue, "key", "");
        let url = (!key.is_empty()).then(|| format!("{}/browse/{}", base_url, key));

        Self {
            summary: str_or(fields, "summary", ""),
            status: object_at(fields, "status")
                .map(JiraStatus::from_remote)
                .unwrap_or_default(),
            assignee: object_at(fields, "assignee")
                .map(JiraUser::from_remote)
                .unwrap_or_default(),
            reporter: object_at(fields, "reporter")
                .map(JiraUser::from_remote)
                .unwrap_or_default(),
            created: str_or(fields, "created", ""),
            updated: str_or(fields, "updated", ""),
            issue_type: object_at(fields, "issuetype")
                .map(JiraIssueType::from_remote)
                .unwrap_or_default(),
            priority: object_at(fields, "priority")
                .map(JiraPriority::from_remote)
                .unwrap_or_default(),
            key,
            url,
        }
    }
}

/// Key, summary and status name of an issue
///
/// All three keys are always serialized; missing values appear as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IssueSummary {
    pub key: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
}

/// An issue reached through a link from another issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkedIssue {
    /// Key of the issue on the other end of the link
    pub key: String,

    /// Link phrase as seen from the queried issue (e.g. "blocks", "is blocked by")
    pub relationship: String,

    /// Summary of the other issue
    pub summary: String,
}

/// A transition available from an issue's current status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IssueTransition {
    pub id: String,
    pub name: String,
}
