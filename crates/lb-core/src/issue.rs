//! The `Issue` entity (§3.1) and its builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{IssueType, Status};

fn is_empty(s: &str) -> bool {
    s.is_empty()
}

/// A cached issue, identified by a stable public identifier (`TEAM-123` or,
/// in local-only mode, `LOCAL-123`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub description: String,
    pub status: Status,
    /// 0 (most urgent) through 4 (least urgent).
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set iff `status == Closed` (invariant 2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub assignee: String,
    /// When this row was last refreshed from the Remote (or created, in
    /// local-only mode). Monotonically non-decreasing (invariant 6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    /// Opaque identifier of the Remote's own internal state, needed to
    /// translate canonical status back into a specific workflow state on
    /// update (§4.3). Never shown to the user; absent in local-only mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_state_id: Option<String>,
}

impl Default for Issue {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            status: Status::Open,
            priority: 2,
            issue_type: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
            assignee: String::new(),
            cached_at: None,
            remote_state_id: None,
        }
    }
}

impl Issue {
    pub fn builder(title: impl Into<String>) -> IssueBuilder {
        IssueBuilder::new(title)
    }

    pub fn is_closed(&self) -> bool {
        self.status == Status::Closed
    }

    /// Close this issue in place, setting `closed_at` (invariant 2).
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.status = Status::Closed;
        self.closed_at = Some(now);
        self.updated_at = now;
    }

    /// Reopen this issue, clearing `closed_at` (invariant 2).
    pub fn reopen(&mut self, status: Status, now: DateTime<Utc>) {
        self.status = status;
        self.closed_at = None;
        self.updated_at = now;
    }
}

/// Fluent builder for [`Issue`], mirroring the prior art's builder shape.
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        let mut issue = Issue::default();
        issue.title = title.into();
        Self { issue }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.issue.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = description.into();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn issue_type(mut self, issue_type: Option<IssueType>) -> Self {
        self.issue.issue_type = issue_type;
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.issue.assignee = assignee.into();
        self
    }

    pub fn remote_state_id(mut self, id: impl Into<String>) -> Self {
        self.issue.remote_state_id = Some(id.into());
        self
    }

    pub fn cached_at(mut self, at: DateTime<Utc>) -> Self {
        self.issue.cached_at = Some(at);
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_issue_is_open() {
        let issue = Issue::default();
        assert_eq!(issue.status, Status::Open);
        assert!(issue.closed_at.is_none());
    }

    #[test]
    fn builder_basic() {
        let issue = Issue::builder("Fix the thing")
            .id("TEAM-1")
            .priority(1)
            .status(Status::InProgress)
            .build();
        assert_eq!(issue.id, "TEAM-1");
        assert_eq!(issue.priority, 1);
        assert_eq!(issue.status, Status::InProgress);
    }

    #[test]
    fn close_sets_closed_at() {
        let mut issue = Issue::builder("X").build();
        let now = Utc::now();
        issue.close(now);
        assert!(issue.is_closed());
        assert_eq!(issue.closed_at, Some(now));
    }

    #[test]
    fn reopen_clears_closed_at() {
        let mut issue = Issue::builder("X").build();
        let now = Utc::now();
        issue.close(now);
        issue.reopen(Status::Open, now);
        assert!(!issue.is_closed());
        assert!(issue.closed_at.is_none());
    }

    #[test]
    fn issue_serde_roundtrip() {
        let issue = Issue::builder("Roundtrip")
            .id("TEAM-2")
            .description("desc")
            .build();
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(issue, back);
    }

    #[test]
    fn optional_fields_omitted_when_absent() {
        let issue = Issue::builder("No extras").id("TEAM-3").build();
        let json = serde_json::to_string(&issue).unwrap();
        assert!(!json.contains("closed_at"));
        assert!(!json.contains("issue_type"));
        assert!(!json.contains("remote_state_id"));
        assert!(!json.contains("description"));
    }
}
