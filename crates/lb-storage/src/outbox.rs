//! Durable outbox queue (§4.4). Rows are appended by command handlers and
//! drained by the background worker; invariant 5 says rows are only ever
//! mutated via `ack`/`fail`, never rewritten in place otherwise.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::store::Store;

/// One pending mutation destined for the Remote.
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: i64,
    pub operation: String,
    pub payload: String,
    pub retry_count: i32,
    pub last_error: Option<String>,
}

impl Store {
    /// Appends a durable outbox entry (§4.4 "writes land in the outbox
    /// before returning").
    pub fn enqueue_outbox(&self, operation: &str, payload: &str) -> Result<i64> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO outbox (operation, payload, created_at) VALUES (?1, ?2, ?3)",
            params![operation, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns the oldest pending entry, if any, ordered by insertion (FIFO
    /// drain order, §4.4).
    pub fn peek_outbox(&self) -> Result<Option<OutboxEntry>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, operation, payload, retry_count, last_error FROM outbox
                 ORDER BY id ASC LIMIT 1",
                [],
                |row| {
                    Ok(OutboxEntry {
                        id: row.get(0)?,
                        operation: row.get(1)?,
                        payload: row.get(2)?,
                        retry_count: row.get(3)?,
                        last_error: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Returns every pending entry ordered by insertion (the worker drains a
    /// whole batch per wake rather than one row at a time, §4.4.4).
    pub fn peek_outbox_batch(&self) -> Result<Vec<OutboxEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, operation, payload, retry_count, last_error FROM outbox ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OutboxEntry {
                    id: row.get(0)?,
                    operation: row.get(1)?,
                    payload: row.get(2)?,
                    retry_count: row.get(3)?,
                    last_error: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn outbox_depth(&self) -> Result<i64> {
        let conn = self.lock_conn()?;
        let depth: i64 = conn.query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))?;
        Ok(depth)
    }

    /// Removes an entry after it has been applied successfully.
    pub fn ack_outbox(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute("DELETE FROM outbox WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Records a failed attempt without removing the entry, so the worker
    /// retries it later (§4.4 "failure backoff").
    pub fn fail_outbox(&self, id: i64, error: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE outbox SET retry_count = retry_count + 1, last_error = ?2 WHERE id = ?1",
            params![id, error],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_and_peek_fifo() {
        let store = Store::open_in_memory().unwrap();
        store.enqueue_outbox("create_issue", "{}").unwrap();
        store.enqueue_outbox("update_issue", "{}").unwrap();
        let first = store.peek_outbox().unwrap().unwrap();
        assert_eq!(first.operation, "create_issue");
    }

    #[test]
    fn ack_removes_entry() {
        let store = Store::open_in_memory().unwrap();
        let id = store.enqueue_outbox("create_issue", "{}").unwrap();
        store.ack_outbox(id).unwrap();
        assert!(store.peek_outbox().unwrap().is_none());
    }

    #[test]
    fn fail_increments_retry_and_keeps_entry() {
        let store = Store::open_in_memory().unwrap();
        let id = store.enqueue_outbox("create_issue", "{}").unwrap();
        store.fail_outbox(id, "network unreachable").unwrap();
        let entry = store.peek_outbox().unwrap().unwrap();
        assert_eq!(entry.retry_count, 1);
        assert_eq!(entry.last_error.as_deref(), Some("network unreachable"));
    }

    #[test]
    fn empty_outbox_peek_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.peek_outbox().unwrap().is_none());
        assert_eq!(store.outbox_depth().unwrap(), 0);
    }

    #[test]
    fn peek_batch_returns_all_pending_in_fifo_order() {
        let store = Store::open_in_memory().unwrap();
        store.enqueue_outbox("create_issue", "{}").unwrap();
        store.enqueue_outbox("update_issue", "{}").unwrap();
        let batch = store.peek_outbox_batch().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].operation, "create_issue");
        assert_eq!(batch[1].operation, "update_issue");
    }
}
