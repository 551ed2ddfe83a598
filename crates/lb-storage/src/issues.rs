//! Issue CRUD (§4.1 contracts: `upsert_issue`, `upsert_issues`, `get_issue`,
//! `list_issues`).

use chrono::{DateTime, Utc};
use lb_core::enums::{IssueType, Status};
use lb_core::issue::Issue;
use rusqlite::{params, Row};

use crate::error::{Result, StorageError};
use crate::store::Store;

const ISSUE_COLUMNS: &str = "id, title, description, status, priority, issue_type, \
     created_at, updated_at, closed_at, assignee, cached_at, remote_state_id";

/// Optional filters applied by `list`/`ready`/`blocked` (§6.1).
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<Status>,
    pub priority: Option<i32>,
    pub issue_type: Option<IssueType>,
    pub assignee: Option<String>,
}

/// Partial update applied by `update` (§4.6). Only `Some` fields change.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdates {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<i32>,
    pub issue_type: Option<Option<IssueType>>,
    pub assignee: Option<Option<String>>,
}

fn fmt_dt(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_dt(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_issue(row: &Row) -> rusqlite::Result<Issue> {
    let status: String = row.get(3)?;
    let issue_type: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    let closed_at: Option<String> = row.get(8)?;
    let cached_at: Option<String> = row.get(10)?;

    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: Status::from(status.as_str()),
        priority: row.get(4)?,
        issue_type: issue_type.map(|s| IssueType::from(s.as_str())),
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
        closed_at: closed_at.as_deref().map(parse_dt),
        assignee: row.get(9)?,
        cached_at: cached_at.as_deref().map(parse_dt),
        remote_state_id: row.get(11)?,
    })
}

impl Store {
    /// Inserts or replaces a single issue by identifier (invariant 1).
    pub fn upsert_issue(&self, issue: &Issue) -> Result<()> {
        let conn = self.lock_conn()?;
        upsert_issue_on_conn(&conn, issue)
    }

    /// Inserts or replaces a batch of issues inside one transaction
    /// (§4.1 "all multi-row writes ... run inside a single transaction").
    pub fn upsert_issues(&self, issues: &[Issue]) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        for issue in issues {
            upsert_issue_on_conn(&tx, issue)?;
        }
        tx.commit().map_err(StorageError::from)
    }

    /// Full-sync replace: clears `issues` then writes `issues` fresh inside
    /// one transaction, returning the count of rows that existed before and
    /// are not in the new set (pruned, §4.5). Dependency rows are left
    /// untouched by this call -- callers re-hydrate `parent-child` edges
    /// separately (§4.5 "parent-child hydration").
    pub fn replace_all_issues(&self, issues: &[Issue]) -> Result<i64> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().map_err(StorageError::from)?;
        let original_count: i64 =
            tx.query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        tx.execute("DELETE FROM issues", [])?;
        for issue in issues {
            upsert_issue_on_conn(&tx, issue)?;
        }
        tx.commit().map_err(StorageError::from)?;
        Ok(original_count - issues.len() as i64)
    }

    pub fn get_issue(&self, id: &str) -> Result<Issue> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
        conn.query_row(&sql, params![id], row_to_issue)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
                other => StorageError::from(other),
            })
    }

    pub fn list_issues(&self, filter: &IssueFilter) -> Result<Vec<Issue>> {
        let conn = self.lock_conn()?;
        let mut conditions = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref status) = filter.status {
            conditions.push(format!("status = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            conditions.push(format!("priority = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(priority));
        }
        if let Some(ref issue_type) = filter.issue_type {
            conditions.push(format!("issue_type = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(issue_type.as_str().to_string()));
        }
        if let Some(ref assignee) = filter.assignee {
            conditions.push(format!("assignee = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(assignee.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues {where_clause} ORDER BY priority ASC, updated_at DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();
        let issues = stmt
            .query_map(param_refs.as_slice(), row_to_issue)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(issues)
    }

    /// Applies a partial update to an issue, bumping `updated_at`, and
    /// enforcing invariant 2 (`closed_at` set iff status = closed).
    pub fn update_issue(&self, id: &str, updates: &IssueUpdates, now: DateTime<Utc>) -> Result<()> {
        let conn = self.lock_conn()?;
        let mut issue = {
            let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
            conn.query_row(&sql, params![id], row_to_issue)
                .map_err(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("issue", id),
                    other => StorageError::from(other),
                })?
        };

        if let Some(ref title) = updates.title {
            issue.title = title.clone();
        }
        if let Some(ref description) = updates.description {
            issue.description = description.clone();
        }
        if let Some(priority) = updates.priority {
            issue.priority = priority;
        }
        if let Some(ref issue_type) = updates.issue_type {
            issue.issue_type = issue_type.clone();
        }
        if let Some(ref assignee) = updates.assignee {
            issue.assignee = assignee.clone().unwrap_or_default();
        }
        if let Some(ref status) = updates.status {
            if *status == Status::Closed {
                issue.close(now);
            } else {
                issue.reopen(status.clone(), now);
            }
        }
        issue.updated_at = now;

        upsert_issue_on_conn(&conn, &issue)
    }

    pub fn close_issue(&self, id: &str, now: DateTime<Utc>) -> Result<()> {
        self.update_issue(
            id,
            &IssueUpdates {
                status: Some(Status::Closed),
                ..Default::default()
            },
            now,
        )
    }

    pub fn delete_issue(&self, id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        let affected = conn.execute("DELETE FROM issues WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::not_found("issue", id));
        }
        conn.execute("DELETE FROM dependencies WHERE issue_id = ?1 OR depends_on_id = ?1", params![id])?;
        Ok(())
    }
}

fn upsert_issue_on_conn(conn: &rusqlite::Connection, issue: &Issue) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO issues ({ISSUE_COLUMNS}) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)
             ON CONFLICT(id) DO UPDATE SET
                title=excluded.title, description=excluded.description, status=excluded.status,
                priority=excluded.priority, issue_type=excluded.issue_type,
                created_at=excluded.created_at, updated_at=excluded.updated_at,
                closed_at=excluded.closed_at, assignee=excluded.assignee,
                cached_at=excluded.cached_at, remote_state_id=excluded.remote_state_id"
        ),
        params![
            issue.id,
            issue.title,
            issue.description,
            issue.status.as_str(),
            issue.priority,
            issue.issue_type.as_ref().map(|t| t.as_str()),
            fmt_dt(&issue.created_at),
            fmt_dt(&issue.updated_at),
            issue.closed_at.as_ref().map(fmt_dt),
            issue.assignee,
            issue.cached_at.as_ref().map(fmt_dt),
            issue.remote_state_id,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Issue {
        Issue::builder("Sample").id(id).build()
    }

    #[test]
    fn upsert_and_get() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&sample("TEAM-1")).unwrap();
        let got = store.get_issue("TEAM-1").unwrap();
        assert_eq!(got.title, "Sample");
    }

    #[test]
    fn upsert_is_idempotent_by_id() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&sample("TEAM-1")).unwrap();
        let mut updated = sample("TEAM-1");
        updated.title = "Changed".to_string();
        store.upsert_issue(&updated).unwrap();

        let list = store.list_issues(&IssueFilter::default()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].title, "Changed");
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = Store::open_in_memory().unwrap();
        let err = store.get_issue("TEAM-404").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn close_sets_closed_at() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&sample("TEAM-1")).unwrap();
        store.close_issue("TEAM-1", Utc::now()).unwrap();
        let got = store.get_issue("TEAM-1").unwrap();
        assert!(got.is_closed());
        assert!(got.closed_at.is_some());
    }

    #[test]
    fn delete_removes_issue_and_its_dependency_rows() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&sample("TEAM-1")).unwrap();
        store.upsert_issue(&sample("TEAM-2")).unwrap();
        store
            .add_dependency(&lb_core::dependency::Dependency::new(
                "TEAM-1",
                "TEAM-2",
                lb_core::enums::DependencyType::Blocks,
                "alice",
            ))
            .unwrap();

        store.delete_issue("TEAM-1").unwrap();
        assert!(store.get_issue("TEAM-1").is_err());
        assert!(store.list_deps_out("TEAM-2").unwrap().is_empty());
    }

    #[test]
    fn replace_all_issues_reports_pruned_count() {
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&sample("TEAM-1")).unwrap();
        store.upsert_issue(&sample("TEAM-2")).unwrap();

        let pruned = store.replace_all_issues(&[sample("TEAM-1")]).unwrap();
        assert_eq!(pruned, 1);
        assert_eq!(store.list_issues(&IssueFilter::default()).unwrap().len(), 1);
    }
}
