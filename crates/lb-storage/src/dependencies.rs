//! Dependency edge CRUD, cycle detection, and tree traversal (§4.1, §4.7,
//! §4.8, §9).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use lb_core::dependency::Dependency;
use lb_core::enums::DependencyType;
use rusqlite::{params, Connection};

use crate::error::{Result, StorageError};
use crate::store::Store;

fn fmt_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// A node in a `dep tree` traversal (§4.7).
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub issue_id: String,
    pub depth: i32,
    pub dep_type: DependencyType,
}

impl Store {
    /// Adds a dependency edge. Duplicate `(issue_id, depends_on_id, type)`
    /// rows are swallowed as idempotent success (§7 "Duplicate"). Cycle
    /// detection only runs for edges that affect reachability (§9).
    pub fn add_dependency(&self, dep: &Dependency) -> Result<()> {
        let conn = self.lock_conn()?;
        add_dependency_on_conn(&conn, dep)
    }

    /// Removes a dependency edge in both orientations (§4.7 "dep remove
    /// deletes both orientations").
    pub fn remove_dependency(&self, a: &str, b: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "DELETE FROM dependencies WHERE (issue_id = ?1 AND depends_on_id = ?2)
                OR (issue_id = ?2 AND depends_on_id = ?1)",
            params![a, b],
        )?;
        Ok(())
    }

    pub fn list_deps_out(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock_conn()?;
        list_deps(&conn, "issue_id", issue_id)
    }

    pub fn list_deps_in(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.lock_conn()?;
        list_deps(&conn, "depends_on_id", issue_id)
    }

    /// Removes every outgoing edge from `issue_id`, used when an issue is
    /// deleted or re-keyed.
    pub fn clear_deps_of(&self, issue_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM dependencies WHERE issue_id = ?1", params![issue_id])?;
        Ok(())
    }

    /// Removes only `issue_id`'s outgoing `parent-child` edge, leaving
    /// `blocks`/`related`/`discovered-from` edges untouched. Used when
    /// re-hydrating parent-child state from a fresh pull, which is
    /// authoritative only for parent identifiers (§4.5).
    pub fn clear_parent_child_edge(&self, issue_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "DELETE FROM dependencies WHERE issue_id = ?1 AND type = 'parent-child'",
            params![issue_id],
        )?;
        Ok(())
    }

    /// Depth-first walk of outgoing `blocks` and `parent-child` edges from
    /// `root`, detecting cycles via a visited set scoped to this call (§4.7,
    /// §9).
    pub fn dependency_tree(&self, root: &str, max_depth: i32) -> Result<Vec<TreeNode>> {
        let conn = self.lock_conn()?;
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        walk_tree(&conn, root, 0, max_depth, &mut visited, &mut out)?;
        Ok(out)
    }
}

fn list_deps(conn: &Connection, column: &str, issue_id: &str) -> Result<Vec<Dependency>> {
    let sql = format!(
        "SELECT issue_id, depends_on_id, type, created_at, created_by FROM dependencies WHERE {column} = ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![issue_id], |row| {
            let dep_type: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok(Dependency {
                issue_id: row.get(0)?,
                depends_on_id: row.get(1)?,
                dep_type: DependencyType::from(dep_type.as_str()),
                created_at: parse_dt(&created_at),
                created_by: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn add_dependency_on_conn(conn: &Connection, dep: &Dependency) -> Result<()> {
    if dep.dep_type.affects_reachability() && would_create_cycle(conn, dep)? {
        return Err(StorageError::CycleDetected);
    }
    conn.execute(
        "INSERT OR IGNORE INTO dependencies (issue_id, depends_on_id, type, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            dep.issue_id,
            dep.depends_on_id,
            dep.dep_type.as_str(),
            fmt_dt(&dep.created_at),
            dep.created_by,
        ],
    )?;
    Ok(())
}

/// BFS from `depends_on_id` over reachability-affecting edges, checking
/// whether `issue_id` is reachable -- i.e. whether adding this edge would
/// close a cycle.
fn would_create_cycle(conn: &Connection, dep: &Dependency) -> Result<bool> {
    if dep.issue_id == dep.depends_on_id {
        return Ok(true);
    }
    let mut frontier = vec![dep.depends_on_id.clone()];
    let mut seen = HashSet::new();
    seen.insert(dep.depends_on_id.clone());

    while let Some(current) = frontier.pop() {
        if current == dep.issue_id {
            return Ok(true);
        }
        let mut stmt = conn.prepare(
            "SELECT depends_on_id, type FROM dependencies WHERE issue_id = ?1",
        )?;
        let next: Vec<(String, String)> = stmt
            .query_map(params![current], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for (next_id, dep_type) in next {
            if DependencyType::from(dep_type.as_str()).affects_reachability()
                && seen.insert(next_id.clone())
            {
                frontier.push(next_id);
            }
        }
    }
    Ok(false)
}

fn walk_tree(
    conn: &Connection,
    node: &str,
    depth: i32,
    max_depth: i32,
    visited: &mut HashSet<String>,
    out: &mut Vec<TreeNode>,
) -> Result<()> {
    if depth > max_depth || !visited.insert(node.to_string()) {
        return Ok(());
    }
    let mut stmt = conn.prepare(
        "SELECT depends_on_id, type FROM dependencies WHERE issue_id = ?1
         AND type IN ('blocks', 'parent-child')",
    )?;
    let children: Vec<(String, String)> = stmt
        .query_map(params![node], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (child_id, dep_type) in children {
        out.push(TreeNode {
            issue_id: child_id.clone(),
            depth: depth + 1,
            dep_type: DependencyType::from(dep_type.as_str()),
        });
        walk_tree(conn, &child_id, depth + 1, max_depth, visited, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::issue::Issue;

    fn seed(store: &Store, ids: &[&str]) {
        for id in ids {
            store.upsert_issue(&Issue::builder("x").id(*id).build()).unwrap();
        }
    }

    #[test]
    fn add_and_list_dependency() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["A", "B"]);
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "alice"))
            .unwrap();
        let out = store.list_deps_out("A").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].depends_on_id, "B");
        let incoming = store.list_deps_in("B").unwrap();
        assert_eq!(incoming.len(), 1);
    }

    #[test]
    fn duplicate_dependency_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["A", "B"]);
        let dep = Dependency::new("A", "B", DependencyType::Blocks, "alice");
        store.add_dependency(&dep).unwrap();
        store.add_dependency(&dep).unwrap();
        assert_eq!(store.list_deps_out("A").unwrap().len(), 1);
    }

    #[test]
    fn remove_dependency_deletes_both_orientations() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["A", "B"]);
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "alice"))
            .unwrap();
        store.remove_dependency("A", "B").unwrap();
        assert!(store.list_deps_out("A").unwrap().is_empty());
        assert!(store.list_deps_in("B").unwrap().is_empty());
    }

    #[test]
    fn cycle_detection_rejects_blocks_cycle() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["A", "B", "C"]);
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Blocks, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("B", "C", DependencyType::Blocks, "x"))
            .unwrap();
        let err = store
            .add_dependency(&Dependency::new("C", "A", DependencyType::Blocks, "x"))
            .unwrap_err();
        assert!(matches!(err, StorageError::CycleDetected));
    }

    #[test]
    fn related_edges_are_never_cycle_checked() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["A", "B"]);
        store
            .add_dependency(&Dependency::new("A", "B", DependencyType::Related, "x"))
            .unwrap();
        // A <-related-> B cycle is fine per design notes (§9).
        store
            .add_dependency(&Dependency::new("B", "A", DependencyType::Related, "x"))
            .unwrap();
    }

    #[test]
    fn clear_parent_child_edge_leaves_other_edges() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["C", "P", "X"]);
        store
            .add_dependency(&Dependency::new("C", "P", DependencyType::ParentChild, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("C", "X", DependencyType::Blocks, "x"))
            .unwrap();

        store.clear_parent_child_edge("C").unwrap();
        let out = store.list_deps_out("C").unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dep_type.as_str(), "blocks");
    }

    #[test]
    fn tree_walk_visits_blocks_and_parent_child_only() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, &["P", "C1", "C2"]);
        store
            .add_dependency(&Dependency::new("C1", "P", DependencyType::ParentChild, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("C2", "P", DependencyType::ParentChild, "x"))
            .unwrap();
        store
            .add_dependency(&Dependency::new("P", "C1", DependencyType::Related, "x"))
            .unwrap();

        let tree = store.dependency_tree("C1", 10).unwrap();
        // only the parent-child edge is walked, not the `related` one
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].issue_id, "P");
    }
}
