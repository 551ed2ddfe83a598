//! Key-value bookkeeping in the `metadata` table: sync cursors, local id
//! counters, schema/migration markers live here too (§4.1, §4.5).

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::store::Store;

const LAST_SYNC_KEY: &str = "last_sync_at";
const LAST_FULL_SYNC_KEY: &str = "last_full_sync_at";
const SYNC_RUN_COUNT_KEY: &str = "sync_run_count";
const NEXT_LOCAL_ID_KEY: &str = "next_local_id";

impl Store {
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        let value = conn
            .query_row("SELECT value FROM metadata WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Records that an incremental sync completed at `at` (§4.5 "the cursor
    /// used for the next incremental pull").
    pub fn mark_last_sync(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_metadata(LAST_SYNC_KEY, &at.to_rfc3339())?;
        let count = self
            .get_metadata(SYNC_RUN_COUNT_KEY)?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        self.set_metadata(SYNC_RUN_COUNT_KEY, &(count + 1).to_string())
    }

    pub fn last_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_metadata(LAST_SYNC_KEY)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    pub fn mark_last_full_sync(&self, at: DateTime<Utc>) -> Result<()> {
        self.set_metadata(LAST_FULL_SYNC_KEY, &at.to_rfc3339())
    }

    /// Number of completed incremental/full syncs, used by `needs_full_sync`
    /// to force a full pull periodically even when the 24h window hasn't
    /// elapsed (§4.5).
    pub fn sync_run_count(&self) -> Result<u64> {
        Ok(self
            .get_metadata(SYNC_RUN_COUNT_KEY)?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0))
    }

    pub fn last_full_sync_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_metadata(LAST_FULL_SYNC_KEY)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc)))
    }

    /// Allocates the next sequential local-only identifier suffix (§4.5
    /// local-only mode ID generation).
    pub fn next_local_id(&self) -> Result<u64> {
        let current = self
            .get_metadata(NEXT_LOCAL_ID_KEY)?
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        self.set_metadata(NEXT_LOCAL_ID_KEY, &next.to_string())?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrip_and_overwrite() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_metadata("foo").unwrap().is_none());
        store.set_metadata("foo", "bar").unwrap();
        assert_eq!(store.get_metadata("foo").unwrap().as_deref(), Some("bar"));
        store.set_metadata("foo", "baz").unwrap();
        assert_eq!(store.get_metadata("foo").unwrap().as_deref(), Some("baz"));
    }

    #[test]
    fn last_sync_tracks_run_count() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.last_sync_at().unwrap().is_none());
        let now = Utc::now();
        store.mark_last_sync(now).unwrap();
        store.mark_last_sync(now).unwrap();
        assert_eq!(store.get_metadata("sync_run_count").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn next_local_id_is_sequential() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.next_local_id().unwrap(), 1);
        assert_eq!(store.next_local_id().unwrap(), 2);
        assert_eq!(store.next_local_id().unwrap(), 3);
    }
}
