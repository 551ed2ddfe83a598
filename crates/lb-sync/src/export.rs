//! Debounced, atomic JSONL export (§4.9).
//!
//! `request_export` is cheap and safe to call from any short-lived command
//! process: it consults a reservation file's mtime rather than holding any
//! in-process timer, since the timer must outlive the requesting process.
//! The spawned export child performs the actual 750 ms debounce delay
//! before writing, so a burst of requests across several command
//! invocations coalesces into a single write.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, SystemTime};

use lb_core::jsonl::{write_jsonl, ExportRow};
use lb_storage::Store;
use tracing::{debug, info};

use crate::error::Result;
use crate::launcher::spawn_export_worker;

/// The window within which a second request is assumed to be covered by
/// an export already in flight (§4.9 "a 2 s reservation window suffices").
pub const RESERVATION_WINDOW: Duration = Duration::from_secs(2);

/// The delay the export child itself waits before writing, letting rapid
/// mutations coalesce (§4.9).
pub const EXPORT_DEBOUNCE: Duration = Duration::from_millis(750);

fn reservation_path(lb_dir: &Path) -> std::path::PathBuf {
    lb_dir.join("export.reservation")
}

/// Called after any cache mutation. Spawns a detached export child unless
/// one is believed to be in flight.
pub fn request_export(db_path: &Path, lb_dir: &Path) -> Result<()> {
    let reservation = reservation_path(lb_dir);
    let now = SystemTime::now();

    let recent = fs::metadata(&reservation)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|mtime| now.duration_since(mtime).ok())
        .map(|age| age < RESERVATION_WINDOW)
        .unwrap_or(false);

    if recent {
        debug!("export already believed in flight, skipping spawn");
        return Ok(());
    }

    fs::write(&reservation, b"")?;
    spawn_export_worker(db_path, lb_dir)
}

/// Entry point for the `--export-worker` re-entry path: sleeps the
/// debounce delay, then writes `issues.jsonl` atomically.
pub fn run_export_worker(store: &Store, lb_dir: &Path) -> Result<()> {
    std::thread::sleep(EXPORT_DEBOUNCE);
    write_snapshot(store, lb_dir)
}

/// Writes `<repo>/.lb/issues.jsonl` atomically: build the full row set,
/// write to `issues.jsonl.tmp`, then rename over the destination (§4.9).
pub fn write_snapshot(store: &Store, lb_dir: &Path) -> Result<()> {
    let mut issues = store.list_issues(&lb_storage::IssueFilter::default())?;
    issues.sort_by(|a, b| a.id.cmp(&b.id));

    let mut rows = Vec::with_capacity(issues.len());
    for issue in &issues {
        let deps = store.list_deps_out(&issue.id)?;
        rows.push(ExportRow::from_issue(issue, deps));
    }

    let tmp_path = lb_dir.join("issues.jsonl.tmp");
    let final_path = lb_dir.join("issues.jsonl");
    {
        let file = File::create(&tmp_path)?;
        write_jsonl(&mut BufWriter::new(file), &rows)?;
    }
    fs::rename(&tmp_path, &final_path)?;
    info!(count = rows.len(), path = ?final_path, "wrote jsonl snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lb_core::issue::Issue;
    use tempfile::tempdir;

    #[test]
    fn write_snapshot_is_sorted_and_atomic() {
        let dir = tempdir().unwrap();
        let store = Store::open_in_memory().unwrap();
        store.upsert_issue(&Issue::builder("B title").id("TEAM-2").build()).unwrap();
        store.upsert_issue(&Issue::builder("A title").id("TEAM-1").build()).unwrap();

        write_snapshot(&store, dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("issues.jsonl")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("TEAM-1"));
        assert!(lines[1].contains("TEAM-2"));
        assert!(!dir.path().join("issues.jsonl.tmp").exists());
    }

    #[test]
    fn request_export_skips_when_reservation_fresh() {
        let dir = tempdir().unwrap();
        fs::write(reservation_path(dir.path()), b"").unwrap();
        // Within the window, so no new reservation timestamp should be
        // written and no spawn attempted (spawn would fail harmlessly
        // against a nonexistent binary path in test, but we only check
        // the reservation short-circuits without error here).
        request_export(Path::new("/nonexistent/db"), dir.path()).unwrap();
    }
}
