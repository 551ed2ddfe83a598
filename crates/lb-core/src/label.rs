//! The `Label` entity (§3.1): `(id, name, team_id?)`, used for repo scoping
//! (`repo:<name>`) and, optionally, type tagging.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

impl Label {
    /// The repo-scope label name for a given repo: `repo:<name>`.
    pub fn repo_scope_name(repo_name: &str) -> String {
        format!("repo:{repo_name}")
    }

    /// The per-type label name predating the `issue_type` field: `type:<t>`.
    pub fn type_scope_name(issue_type: &crate::enums::IssueType) -> String {
        format!("type:{}", issue_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_scope_name_format() {
        assert_eq!(Label::repo_scope_name("lb"), "repo:lb");
    }

    #[test]
    fn type_scope_name_format() {
        use crate::enums::IssueType;
        assert_eq!(Label::type_scope_name(&IssueType::Bug), "type:bug");
    }
}
