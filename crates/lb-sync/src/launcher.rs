//! Spawns a detached child that re-enters the binary as `--worker` or
//! `--export-worker` (§4.4.6).

use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::Result;
use crate::pidfile::PidFile;

/// The flag the re-entrant child recognises before constructing a
/// `RuntimeContext`, so the scheduler is never initialised recursively
/// (§9 "Process-wide state").
pub const WORKER_FLAG: &str = "--worker";
pub const EXPORT_WORKER_FLAG: &str = "--export-worker";

/// Spawns `current_exe <flag> --db <db_path>` detached from the caller's
/// controlling terminal, with both output streams redirected to
/// `<repo>/.lb/sync.log`. Returns without waiting for the child.
pub fn spawn_detached(flag: &str, db_path: &Path, lb_dir: &Path) -> Result<()> {
    let log_path = lb_dir.join("sync.log");
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;
    let log_file_err = log_file.try_clone()?;

    let exe = std::env::current_exe()?;
    let mut cmd = Command::new(exe);
    cmd.arg(flag)
        .arg("--db")
        .arg(db_path)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err));

    detach(&mut cmd);

    debug!(flag, ?db_path, "spawning detached worker");
    cmd.spawn()?;
    Ok(())
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Start the child in its own process group so it survives the
    // caller's exit and never receives signals sent to our group.
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn detach(_cmd: &mut Command) {}

/// Launches the sync worker unless one is already running, per the
/// election protocol (§4.4.2). Enqueuers that find a live worker touch its
/// PID file instead of spawning (§4.4.3).
pub fn ensure_worker_running(db_path: &Path, lb_dir: &Path) -> Result<()> {
    let pid_path = lb_dir.join("sync.pid");
    let pid_file = PidFile::new(&pid_path);
    if pid_file.should_spawn() {
        spawn_detached(WORKER_FLAG, db_path, lb_dir)
    } else {
        pid_file.touch()
    }
}

/// Requests an export run. Export scheduling is debounced by the caller
/// (§4.9); this just spawns the detached export child.
pub fn spawn_export_worker(db_path: &Path, lb_dir: &Path) -> Result<()> {
    spawn_detached(EXPORT_WORKER_FLAG, db_path, lb_dir)
}
