//! Label bookkeeping (§3.1). No CLI verb manages labels directly; they
//! exist to record repo-scope membership (`repo:<name>`, §4.5).

use lb_core::label::Label;
use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::store::Store;

impl Store {
    /// Inserts a label if absent and returns its row, keyed by name.
    pub fn get_or_create_label(&self, name: &str, team_id: Option<&str>) -> Result<Label> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO labels (name, team_id) VALUES (?1, ?2)",
            params![name, team_id],
        )?;
        let (id, team_id): (i64, Option<String>) = conn.query_row(
            "SELECT id, team_id FROM labels WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(Label {
            id,
            name: name.to_string(),
            team_id,
        })
    }

    pub fn get_label(&self, name: &str) -> Result<Option<Label>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, team_id FROM labels WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Label {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        team_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let a = store.get_or_create_label("repo:lb", None).unwrap();
        let b = store.get_or_create_label("repo:lb", None).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn get_label_missing_is_none() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.get_label("repo:nope").unwrap().is_none());
    }
}
