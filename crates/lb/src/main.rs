//! `lb` -- a local-first mirror of Remote issues.

mod cli;
mod commands;
mod context;
mod output;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

fn main() {
    // The two internal re-entry flags replace the normal command surface
    // entirely and must be handled before clap ever sees the argument
    // list, since they're passed by the launcher, not a human.
    let raw: Vec<String> = std::env::args().collect();
    if let Some(code) = try_worker_reentry(&raw) {
        std::process::exit(code);
    }

    let cli = Cli::parse();
    init_tracing(cli.global.verbose);
    install_ctrlc_handler();

    let json = cli.global.json;
    match run(cli) {
        Ok(()) => {}
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            if json {
                let body = serde_json::json!({ "error": err.to_string() });
                eprintln!("{body}");
            } else {
                eprintln!("error: {err:#}");
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = RuntimeContext::from_global_args(&cli.global)?;
    match cli.command {
        Commands::Init(args) => commands::init::run(&ctx, &args),
        Commands::Auth(args) => commands::auth::run(&ctx, &args),
        Commands::Whoami => commands::whoami::run(&ctx),
        Commands::List(args) => commands::list::run(&ctx, &args),
        Commands::Ready(args) => commands::ready::run(&ctx, &args),
        Commands::Blocked(args) => commands::blocked::run(&ctx, &args),
        Commands::Show(args) => commands::show::run(&ctx, &args),
        Commands::Create(args) => commands::create::run(&ctx, &args),
        Commands::Update(args) => commands::update::run(&ctx, &args),
        Commands::Close(args) => commands::close::run(&ctx, &args),
        Commands::Delete(args) => commands::delete::run(&ctx, &args),
        Commands::Dep(args) => commands::dep::run(&ctx, &args),
        Commands::Sync(args) => commands::sync_cmd::run(&ctx, &args),
        Commands::Import(args) => commands::import::run(&ctx, &args),
        Commands::Export(args) => commands::export::run(&ctx, &args),
        Commands::Migrate(args) => commands::migrate::run(&ctx, &args),
        Commands::Onboard(args) => commands::onboard::run(&ctx, &args),
    }
}

/// Handles `--worker` / `--export-worker` re-entry before any normal CLI
/// parsing happens, so the spawned child never tries to recurse into the
/// scheduler it was launched by. Returns the process exit code if this was
/// a re-entry invocation, `None` otherwise.
fn try_worker_reentry(raw: &[String]) -> Option<i32> {
    let is_worker = raw.iter().any(|a| a == lb_sync::launcher::WORKER_FLAG);
    let is_export_worker = raw.iter().any(|a| a == lb_sync::launcher::EXPORT_WORKER_FLAG);
    if !is_worker && !is_export_worker {
        return None;
    }

    let db_path = find_flag_value(raw, "--db").map(PathBuf::from)?;
    let lb_dir = db_path.parent()?.to_path_buf();
    init_tracing_to_file(&lb_dir);

    let code = if is_worker {
        run_worker_reentry(&db_path, &lb_dir)
    } else {
        run_export_worker_reentry(&db_path, &lb_dir)
    };
    Some(code)
}

fn run_worker_reentry(db_path: &std::path::Path, lb_dir: &std::path::Path) -> i32 {
    let store = match lb_storage::Store::open(db_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "worker failed to open store");
            return 1;
        }
    };
    let repo_root = lb_dir.parent().unwrap_or(lb_dir);
    let config = match lb_config::config::resolve(repo_root, lb_config::PartialConfig::default()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "worker failed to resolve config");
            return 1;
        }
    };
    let Some(api_key) = config.api_key.clone() else {
        tracing::warn!("worker has no api key configured, nothing to push or pull");
        return 0;
    };
    let client = lb_remote::RemoteClient::new(&api_key);
    let scope = match context::resolve_sync_scope(&store, &client, &config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "worker failed to resolve repo scope");
            return 1;
        }
    };
    let pid_path = lb_dir.join("sync.pid");
    match lb_sync::worker::run(&store, &client, scope, &pid_path, db_path, lb_dir, lb_sync::worker::WorkerConfig::default()) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "worker exited with an error");
            1
        }
    }
}

fn run_export_worker_reentry(db_path: &std::path::Path, lb_dir: &std::path::Path) -> i32 {
    let store = match lb_storage::Store::open(db_path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "export worker failed to open store");
            return 1;
        }
    };
    // The exporter is an optimisation over the canonical cache, never a
    // correctness requirement, so a failed snapshot write is logged and
    // swallowed rather than surfaced as a process failure.
    if let Err(e) = lb_sync::export::run_export_worker(&store, lb_dir) {
        tracing::warn!(error = %e, "export worker failed to write snapshot");
    }
    0
}

fn find_flag_value(raw: &[String], flag: &str) -> Option<String> {
    raw.iter().position(|a| a == flag).and_then(|i| raw.get(i + 1)).cloned()
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "lb=debug" } else { "lb=info" })
    });
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Worker/export-worker re-entry duplicates its log output to
/// `<repo>/.lb/sync.log` rather than the interactive stderr a foreground
/// command writes to.
fn init_tracing_to_file(lb_dir: &std::path::Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lb=info"));
    let log_path = lb_dir.join("sync.log");
    if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(log_path) {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(file).try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    }
}

/// A first Ctrl-C requests a graceful stop; a second forces immediate exit,
/// in case a command is blocked on a slow network call.
fn install_ctrlc_handler() {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    let _ = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        eprintln!("\ninterrupted, press Ctrl-C again to force exit");
    });
}
