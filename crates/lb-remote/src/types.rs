//! Wire-shaped types returned by the Remote client (§4.3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by `identify current user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteTeam {
    pub id: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLabel {
    pub id: String,
    pub name: String,
}

/// One issue as returned by the Remote, prior to translation into
/// [`lb_core::issue::Issue`] (§4.3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub workflow_state_type: String,
    pub workflow_state_id: String,
    pub priority: i32,
    #[serde(default)]
    pub assignee_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// An issue-to-issue relation, direction-tagged (§4.3 "fetch relations
/// (outgoing + incoming) for one issue").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRelation {
    pub issue_id: String,
    pub related_issue_id: String,
    pub relation_type: String,
}

/// Pagination cursor returned alongside a page of issues (§4.3 "optionally
/// paginated").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Filter applied when fetching issues in repo scope (§4.2, §4.5).
#[derive(Debug, Clone, Default)]
pub struct IssueScopeFilter {
    pub team_id: String,
    pub label_name: Option<String>,
    pub project_name: Option<String>,
    pub updated_since: Option<DateTime<Utc>>,
    pub cursor: Option<String>,
    pub page_size: u32,
}
