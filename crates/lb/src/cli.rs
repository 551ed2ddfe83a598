//! Argument definitions for every `lb` subcommand.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "lb", about = "A local-first mirror of Remote issues", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Override store discovery with an explicit path to the cache database.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Emit machine-readable JSON instead of formatted text.
    #[arg(short = 'j', long = "json", global = true)]
    pub json: bool,

    /// Enable debug-level logging on stderr.
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Initialize a local cache in the current repository.
    Init(InitArgs),
    /// Configure or inspect Remote credentials.
    Auth(AuthArgs),
    /// Print the identity of the authenticated Remote user.
    Whoami,
    /// List issues.
    List(ListArgs),
    /// List issues that are open and unblocked.
    Ready(ListArgs),
    /// List issues that are open and blocked.
    Blocked(ListArgs),
    /// Show a single issue.
    Show(ShowArgs),
    /// Create a new issue.
    Create(CreateArgs),
    /// Update an existing issue.
    Update(UpdateArgs),
    /// Close an issue.
    Close(CloseArgs),
    /// Delete an issue.
    Delete(DeleteArgs),
    /// Manage dependencies between issues.
    Dep(DepArgs),
    /// Sync the local cache with Remote.
    Sync(SyncArgs),
    /// Import issues from an external JSONL snapshot.
    Import(ImportArgs),
    /// Write the canonical JSONL snapshot.
    Export(ExportArgs),
    /// Run a one-off cache migration.
    Migrate(MigrateArgs),
    /// Print a quick-start summary for a new contributor.
    Onboard(OnboardArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Re-initialize even if a cache already exists.
    #[arg(long)]
    pub force: bool,

    /// Skip Remote entirely; issues are created with LOCAL-<n> identifiers.
    #[arg(long)]
    pub local_only: bool,
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    /// Restrict this repo's sync scope to the given team key.
    #[arg(long)]
    pub team: Option<String>,

    /// Print the currently configured credentials (the API key is masked).
    #[arg(long)]
    pub show: bool,

    /// Remove stored credentials.
    #[arg(long)]
    pub clear: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by status (open, in_progress, closed).
    #[arg(short = 's', long = "status")]
    pub status: Option<String>,

    /// Filter by priority (0-4).
    #[arg(short = 'p', long = "priority")]
    pub priority: Option<i32>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Include closed issues.
    #[arg(long)]
    pub all: bool,

    /// Refresh the cache from Remote before listing (§4.5).
    #[arg(long)]
    pub sync: bool,

    /// Override the configured team key for this call.
    #[arg(long)]
    pub team: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub id: String,

    /// Hydrate this issue's non-blocking relations from Remote before showing it (§4.5).
    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub title: String,

    #[arg(short = 'd', long = "description")]
    pub description: Option<String>,

    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    #[arg(short = 'p', long = "priority")]
    pub priority: Option<i32>,

    /// Parent issue id; creates a parent-child dependency.
    #[arg(long)]
    pub parent: Option<String>,

    /// Issue ids this new issue blocks (repeatable).
    #[arg(long = "blocks")]
    pub blocks: Vec<String>,

    /// Issue ids this new issue is blocked by (repeatable).
    #[arg(long = "blocked-by")]
    pub blocked_by: Vec<String>,

    /// Issue ids related to this new issue (repeatable).
    #[arg(long = "related")]
    pub related: Vec<String>,

    /// Issue ids this issue was discovered from (repeatable).
    #[arg(long = "discovered-from")]
    pub discovered_from: Vec<String>,

    /// Legacy comma-separated `type:ID` dependency list.
    #[arg(long = "deps")]
    pub deps: Option<String>,

    /// Assign to an email address, or "me" for the authenticated viewer.
    #[arg(long = "assign")]
    pub assign: Option<String>,

    /// Refresh the cache and mutate Remote inline instead of queueing (§4.6).
    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: String,

    #[arg(long = "title")]
    pub title: Option<String>,

    #[arg(short = 'd', long = "description")]
    pub description: Option<String>,

    #[arg(short = 's', long = "status")]
    pub status: Option<String>,

    #[arg(short = 'p', long = "priority")]
    pub priority: Option<i32>,

    /// Assign to an email address, or "me" for the authenticated viewer.
    #[arg(long = "assign")]
    pub assign: Option<String>,

    /// Clear the current assignee.
    #[arg(long)]
    pub unassign: bool,

    /// Re-parent this issue; pass an empty string to clear the parent.
    #[arg(long)]
    pub parent: Option<String>,

    #[arg(long = "blocks")]
    pub blocks: Vec<String>,

    #[arg(long = "blocked-by")]
    pub blocked_by: Vec<String>,

    #[arg(long = "related")]
    pub related: Vec<String>,

    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct CloseArgs {
    pub id: String,

    #[arg(short = 'r', long = "reason")]
    pub reason: Option<String>,

    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

#[derive(Debug, Subcommand)]
pub enum DepCommands {
    /// Add a dependency edge.
    Add(DepAddArgs),
    /// Remove a dependency edge (both orientations).
    Remove(DepRemoveArgs),
    /// Print the dependency tree rooted at an issue.
    Tree(DepTreeArgs),
}

#[derive(Debug, Args)]
pub struct DepAddArgs {
    pub id: String,

    #[arg(long, conflicts_with_all = ["blocked_by", "related"])]
    pub blocks: Option<String>,

    #[arg(long = "blocked-by", conflicts_with_all = ["blocks", "related"])]
    pub blocked_by: Option<String>,

    #[arg(long, conflicts_with_all = ["blocks", "blocked_by"])]
    pub related: Option<String>,
}

#[derive(Debug, Args)]
pub struct DepRemoveArgs {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Args)]
pub struct DepTreeArgs {
    pub id: String,

    /// Maximum depth to walk (0 = unbounded).
    #[arg(long, default_value_t = 0)]
    pub max_depth: i32,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Force a full paginated pull regardless of staleness triggers.
    #[arg(long)]
    pub full: bool,

    /// Override the configured team key for this call.
    #[arg(long)]
    pub team: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(long)]
    pub source: PathBuf,

    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub include_closed: bool,

    #[arg(long)]
    pub since: Option<String>,

    /// Proceed even if the import map already contains entries.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "beads")]
    pub format: String,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommands,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommands {
    /// Drop per-type labels in favor of the `issue_type` field.
    RemoveTypeLabels(MigrateRemoveTypeLabelsArgs),
    /// Migrate repo scoping from labels to a project.
    ToProject(MigrateToProjectArgs),
}

#[derive(Debug, Args)]
pub struct MigrateRemoveTypeLabelsArgs {
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub remove_label: bool,
}

#[derive(Debug, Args)]
pub struct MigrateToProjectArgs {
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub remove_label: bool,
}

#[derive(Debug, Args)]
pub struct OnboardArgs {
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
