//! Schema DDL and migrations (§4.1).

pub const CURRENT_SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS issues (
        id              TEXT PRIMARY KEY,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL DEFAULT '',
        status          TEXT NOT NULL DEFAULT 'open',
        priority        INTEGER NOT NULL DEFAULT 2,
        issue_type      TEXT,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        closed_at       TEXT,
        assignee        TEXT NOT NULL DEFAULT '',
        cached_at       TEXT,
        remote_state_id TEXT
    );",
    "CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);",
    "CREATE INDEX IF NOT EXISTS idx_issues_cached_at ON issues(cached_at);",
    "CREATE TABLE IF NOT EXISTS dependencies (
        issue_id        TEXT NOT NULL,
        depends_on_id   TEXT NOT NULL,
        type            TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        created_by      TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (issue_id, depends_on_id, type)
    );",
    "CREATE INDEX IF NOT EXISTS idx_dependencies_issue_id ON dependencies(issue_id, depends_on_id);",
    "CREATE INDEX IF NOT EXISTS idx_dependencies_depends_on_id ON dependencies(depends_on_id);",
    "CREATE TABLE IF NOT EXISTS labels (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        name    TEXT NOT NULL UNIQUE,
        team_id TEXT
    );",
    "CREATE TABLE IF NOT EXISTS outbox (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        operation   TEXT NOT NULL,
        payload     TEXT NOT NULL,
        created_at  TEXT NOT NULL,
        retry_count INTEGER NOT NULL DEFAULT 0,
        last_error  TEXT
    );",
    "CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );",
];

/// `(name, sql)` pairs applied at most once, tracked via `metadata` keys
/// `migration:<name>`.
///
/// The only migration named by the spec (§4.1): relaxing `NOT NULL` on
/// `issue_type` (version 0 -> 1). `SCHEMA_STATEMENTS` above already creates
/// `issue_type` as nullable for fresh installs, so this migration's SQL is
/// the idempotent table-rebuild needed to carry a pre-existing NOT-NULL
/// column forward; it is a correct no-op-equivalent when run against a
/// table that was already nullable.
pub const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_relax_issue_type_not_null",
    "CREATE TABLE IF NOT EXISTS issues_new (
        id              TEXT PRIMARY KEY,
        title           TEXT NOT NULL,
        description     TEXT NOT NULL DEFAULT '',
        status          TEXT NOT NULL DEFAULT 'open',
        priority        INTEGER NOT NULL DEFAULT 2,
        issue_type      TEXT,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        closed_at       TEXT,
        assignee        TEXT NOT NULL DEFAULT '',
        cached_at       TEXT,
        remote_state_id TEXT
    );
    INSERT INTO issues_new SELECT id, title, description, status, priority,
        NULLIF(issue_type, ''), created_at, updated_at, closed_at, assignee,
        cached_at, remote_state_id FROM issues;
    DROP TABLE issues;
    ALTER TABLE issues_new RENAME TO issues;
    CREATE INDEX IF NOT EXISTS idx_issues_status ON issues(status);
    CREATE INDEX IF NOT EXISTS idx_issues_cached_at ON issues(cached_at);",
)];
