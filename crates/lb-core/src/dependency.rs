//! The `Dependency` edge type (§3.1).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::DependencyType;

/// A directed edge `(issue_id, depends_on_id, type)`.
///
/// `issue_id` "has" the edge; `depends_on_id` is the target. For
/// `DependencyType::Blocks`, `issue_id` blocks `depends_on_id`. For
/// `DependencyType::ParentChild`, `depends_on_id` is the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub issue_id: String,
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub created_at: DateTime<Utc>,
    /// Who (or what) created this edge: an actor email, or `"sync"` when
    /// reconciled from the Remote (§6.3 example).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
}

impl Dependency {
    pub fn new(
        issue_id: impl Into<String>,
        depends_on_id: impl Into<String>,
        dep_type: DependencyType,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            issue_id: issue_id.into(),
            depends_on_id: depends_on_id.into(),
            dep_type,
            created_at: Utc::now(),
            created_by: created_by.into(),
        }
    }

    /// The inverse edge, used when `--blocked-by <T>` is given: it is stored
    /// as `(T, id, blocks)` (§4.7).
    pub fn inverse(&self) -> Self {
        Self {
            issue_id: self.depends_on_id.clone(),
            depends_on_id: self.issue_id.clone(),
            dep_type: self.dep_type.clone(),
            created_at: self.created_at,
            created_by: self.created_by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_swaps_endpoints() {
        let dep = Dependency::new("A", "B", DependencyType::Blocks, "alice");
        let inv = dep.inverse();
        assert_eq!(inv.issue_id, "B");
        assert_eq!(inv.depends_on_id, "A");
    }

    #[test]
    fn serde_omits_empty_created_by() {
        let dep = Dependency::new("A", "B", DependencyType::Blocks, "");
        let json = serde_json::to_string(&dep).unwrap();
        assert!(!json.contains("created_by"));
    }
}
