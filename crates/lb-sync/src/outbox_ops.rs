//! The concrete shapes enqueued as outbox rows (§4.4.4 "operations map
//! one-to-one to Remote calls"). Command handlers serialize one of these
//! into `outbox.payload`; the worker deserializes and dispatches.

use lb_core::enums::DependencyType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `operation` column values (§4.1 schema).
pub mod kind {
    pub const CREATE_ISSUE: &str = "create_issue";
    pub const UPDATE_ISSUE: &str = "update_issue";
    pub const DELETE_ISSUE: &str = "delete_issue";
    pub const CREATE_RELATION: &str = "create_relation";
    pub const DELETE_RELATION: &str = "delete_relation";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIssuePayload {
    pub local_id: String,
    pub team_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: i32,
    /// Deferred relations to create once the Remote has assigned a real
    /// id (§4.4.4 "followed by best-effort creation of any deferred
    /// relations whose textual form was persisted in the payload").
    #[serde(default)]
    pub deferred_relations: Vec<(DependencyType, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateIssuePayload {
    pub remote_id: String,
    pub local_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteIssuePayload {
    pub remote_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationPayload {
    pub issue_remote_id: String,
    pub related_remote_id: String,
    pub relation_type: String,
}

pub fn encode<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string(payload)
}

pub fn decode<T: for<'de> Deserialize<'de>>(raw: &str) -> serde_json::Result<T> {
    serde_json::from_str(raw)
}

/// Best-effort extraction used for logging a malformed row without
/// failing the whole dispatch.
pub fn describe(raw: &str) -> String {
    serde_json::from_str::<Value>(raw)
        .map(|v| v.to_string())
        .unwrap_or_else(|_| "<unparseable payload>".to_string())
}
