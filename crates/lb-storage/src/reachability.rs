//! Reachability queries backing `ready`/`blocked` (§4.8).

use std::collections::{HashMap, HashSet};

use lb_core::enums::Status;
use lb_core::issue::Issue;
use rusqlite::params;

use crate::error::Result;
use crate::issues::IssueFilter;
use crate::store::Store;

/// A blocked issue paired with the open issues that directly block it
/// (§4.8 "with, per item, the set of open issues that block it directly").
#[derive(Debug, Clone)]
pub struct BlockedIssue {
    pub issue: Issue,
    pub blockers: Vec<Issue>,
}

impl Store {
    /// The set of issue ids that are currently blocked: direct `blocks`
    /// edges from a non-closed issue, plus parent-child inheritance to a
    /// fixed point (§4.8).
    pub fn blocked_set(&self) -> Result<HashSet<String>> {
        let conn = self.lock_conn()?;

        let mut blocks_edges: Vec<(String, String)> = Vec::new();
        let mut parent_child_edges: Vec<(String, String)> = Vec::new();
        {
            let mut stmt = conn.prepare("SELECT issue_id, depends_on_id, type FROM dependencies")?;
            let rows = stmt.query_map([], |row| {
                let issue_id: String = row.get(0)?;
                let depends_on_id: String = row.get(1)?;
                let dep_type: String = row.get(2)?;
                Ok((issue_id, depends_on_id, dep_type))
            })?;
            for row in rows {
                let (issue_id, depends_on_id, dep_type) = row?;
                match dep_type.as_str() {
                    "blocks" => blocks_edges.push((issue_id, depends_on_id)),
                    "parent-child" => parent_child_edges.push((issue_id, depends_on_id)),
                    _ => {}
                }
            }
        }

        let open_ids: HashSet<String> = {
            let mut stmt = conn.prepare("SELECT id FROM issues WHERE status != ?1")?;
            let rows = stmt.query_map(params![Status::Closed.as_str()], |row| row.get::<_, String>(0))?;
            rows.collect::<std::result::Result<_, _>>()?
        };

        let mut blocked = HashSet::new();
        for (blocker_id, blocked_id) in &blocks_edges {
            if open_ids.contains(blocker_id) {
                blocked.insert(blocked_id.clone());
            }
        }

        // Fixed point: a child inherits its parent's blocked status.
        loop {
            let mut changed = false;
            for (child_id, parent_id) in &parent_child_edges {
                if blocked.contains(parent_id) && blocked.insert(child_id.clone()) {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(blocked)
    }

    /// Open issues not in the blocked set, optionally scoped to a single
    /// assignee (§4.8).
    pub fn ready_set(&self, assignee: Option<&str>) -> Result<Vec<Issue>> {
        let blocked = self.blocked_set()?;
        let mut filter = IssueFilter {
            status: Some(Status::Open),
            ..Default::default()
        };
        if let Some(assignee) = assignee {
            filter.assignee = Some(assignee.to_string());
        }
        let issues = self.list_issues(&filter)?;
        Ok(issues.into_iter().filter(|i| !blocked.contains(&i.id)).collect())
    }

    /// Non-closed issues in the blocked set, each paired with its direct
    /// open blockers.
    pub fn blocked_issues(&self) -> Result<Vec<BlockedIssue>> {
        let blocked = self.blocked_set()?;
        if blocked.is_empty() {
            return Ok(Vec::new());
        }

        let all_issues = self.list_issues(&IssueFilter::default())?;
        let by_id: HashMap<String, Issue> =
            all_issues.into_iter().map(|i| (i.id.clone(), i)).collect();

        let mut direct_blockers: HashMap<String, Vec<String>> = HashMap::new();
        for id in &blocked {
            let blockers = self
                .list_deps_in(id)?
                .into_iter()
                .filter(|dep| dep.dep_type.as_str() == "blocks")
                .filter(|dep| {
                    by_id
                        .get(&dep.issue_id)
                        .map(|i| !i.is_closed())
                        .unwrap_or(false)
                })
                .map(|dep| dep.issue_id)
                .collect();
            direct_blockers.insert(id.clone(), blockers);
        }

        let mut out = Vec::new();
        for (id, issue) in &by_id {
            if !blocked.contains(id) || issue.is_closed() {
                continue;
            }
            let blockers = direct_blockers
                .get(id)
                .into_iter()
                .flatten()
                .filter_map(|bid| by_id.get(bid).cloned())
                .collect();
            out.push(BlockedIssue {
                issue: issue.clone(),
                blockers,
            });
        }
        out.sort_by(|a, b| a.issue.id.cmp(&b.issue.id));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::dependency::Dependency;
    use lb_core::enums::DependencyType;

    fn issue(id: &str) -> Issue {
        Issue::builder("x").id(id).build()
    }

    #[test]
    fn direct_block_excludes_from_ready() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&issue("A")).unwrap();
        store.upsert_issue(&issue("B")).unwrap();
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "x"))
            .unwrap();

        let ready_ids: Vec<_> = store.ready_set(None).unwrap().into_iter().map(|i| i.id).collect();
        assert!(ready_ids.contains(&"A".to_string()));
        assert!(!ready_ids.contains(&"B".to_string()));
    }

    #[test]
    fn closing_blocker_unblocks() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&issue("A")).unwrap();
        store.upsert_issue(&issue("B")).unwrap();
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "x"))
            .unwrap();
        store.close_issue("A", chrono::Utc::now()).unwrap();

        let ready_ids: Vec<_> = store.ready_set(None).unwrap().into_iter().map(|i| i.id).collect();
        assert!(ready_ids.contains(&"B".to_string()));
    }

    #[test]
    fn parent_child_inherits_blocking() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&issue("X")).unwrap();
        store.upsert_issue(&issue("P")).unwrap();
        store.upsert_issue(&issue("C1")).unwrap();
        store.upsert_issue(&issue("C2")).unwrap();
        store
            .add_dependency(&Dependency::new("X", "P", DependencyType::Blocks, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("C1", "P", DependencyType::ParentChild, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("C2", "P", DependencyType::ParentChild, "x"))
            .unwrap();

        let blocked = store.blocked_set().unwrap();
        assert!(blocked.contains("P"));
        assert!(blocked.contains("C1"));
        assert!(blocked.contains("C2"));
        assert!(!blocked.contains("X"));

        let ready_ids: Vec<_> = store.ready_set(None).unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ready_ids, vec!["X".to_string()]);

        store.close_issue("X", chrono::Utc::now()).unwrap();
        let blocked_after = store.blocked_set().unwrap();
        assert!(blocked_after.is_empty());
    }

    #[test]
    fn blocked_issues_lists_direct_open_blockers() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&issue("A")).unwrap();
        store.upsert_issue(&issue("B")).unwrap();
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "x"))
            .unwrap();

        let blocked = store.blocked_issues().unwrap();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].issue.id, "B");
        assert_eq!(blocked[0].blockers.len(), 1);
        assert_eq!(blocked[0].blockers[0].id, "A");
    }

    #[test]
    fn ready_and_blocked_are_disjoint() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&issue("A")).unwrap();
        store.upsert_issue(&issue("B")).unwrap();
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "x"))
            .unwrap();

        let ready: HashSet<String> = store.ready_set(None).unwrap().into_iter().map(|i| i.id).collect();
        let blocked: HashSet<String> =
            store.blocked_issues().unwrap().into_iter().map(|b| b.issue.id).collect();
        assert!(ready.is_disjoint(&blocked));
    }
}
