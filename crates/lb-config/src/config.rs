//! Layered configuration (§4.2): CLI flag ≺ environment variable ≺ per-repo
//! file ≺ global file ≺ hard-coded defaults (highest priority first).
//!
//! Parsing tolerates comments (JSON with comments, ".jsonc"); a plain
//! ".json" file is accepted as a fallback. This is a small hand-rolled
//! merge rather than a single-file loader (contrast the prior art's
//! `load_config`/`save_config` over one YAML file) because no single
//! off-the-shelf layering crate covers "CLI flag overlay + JSONC-tolerant
//! file layers" in one shot; the directory-discovery idiom underneath it
//! (`dirs.rs`) is unchanged from that prior art.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dirs;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoScope {
    Label,
    Project,
    Both,
}

impl Default for RepoScope {
    fn default() -> Self {
        Self::Label
    }
}

/// The fully-resolved configuration, after merging all layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub team_key: Option<String>,
    pub team_id: Option<String>,
    pub repo_name: Option<String>,
    pub repo_scope: RepoScope,
    pub cache_ttl_seconds: u64,
    pub local_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            team_key: None,
            team_id: None,
            repo_name: None,
            repo_scope: RepoScope::default(),
            cache_ttl_seconds: 120,
            local_only: false,
        }
    }
}

/// A single layer: every field optional, `None` meaning "this layer has no
/// opinion", so that merging is a simple "last non-`None` wins" fold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_scope: Option<RepoScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_only: Option<bool>,
}

impl PartialConfig {
    /// Overlays `higher` onto `self`, preferring `higher`'s fields wherever
    /// they're set. `self` is the lower-priority layer.
    fn overlay(mut self, higher: PartialConfig) -> Self {
        macro_rules! take {
            ($field:ident) => {
                if higher.$field.is_some() {
                    self.$field = higher.$field;
                }
            };
        }
        take!(api_key);
        take!(team_key);
        take!(team_id);
        take!(repo_name);
        take!(repo_scope);
        take!(cache_ttl_seconds);
        take!(local_only);
        self
    }

    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            api_key: self.api_key,
            team_key: self.team_key,
            team_id: self.team_id,
            repo_name: self.repo_name,
            repo_scope: self.repo_scope.unwrap_or(defaults.repo_scope),
            cache_ttl_seconds: self.cache_ttl_seconds.unwrap_or(defaults.cache_ttl_seconds),
            local_only: self.local_only.unwrap_or(defaults.local_only),
        }
    }
}

/// Strips `//` line comments and `/* */` block comments outside of string
/// literals, so JSONC files can be fed to `serde_json`.
fn strip_jsonc_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn load_layer(path: &Path) -> Result<PartialConfig, ConfigError> {
    if !path.exists() {
        return Ok(PartialConfig::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let stripped = strip_jsonc_comments(&raw);
    serde_json::from_str(&stripped).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Locates the per-repo config file: `config.jsonc` preferred, `config.json`
/// as a fallback.
fn repo_config_path(repo_root: &Path) -> std::path::PathBuf {
    let lb = dirs::lb_dir(repo_root);
    let jsonc = lb.join("config.jsonc");
    if jsonc.exists() {
        jsonc
    } else {
        lb.join("config.json")
    }
}

fn global_config_path() -> Option<std::path::PathBuf> {
    dirs::global_config_dir().map(|dir| {
        let jsonc = dir.join("config.jsonc");
        if jsonc.exists() {
            jsonc
        } else {
            dir.join("config.json")
        }
    })
}

/// Builds the environment-variable layer (§6.4).
fn env_layer() -> PartialConfig {
    PartialConfig {
        api_key: std::env::var("LINEAR_API_KEY").ok(),
        team_key: std::env::var("LB_TEAM_KEY").ok(),
        team_id: std::env::var("LB_TEAM_ID").ok(),
        repo_name: std::env::var("LB_REPO_NAME").ok(),
        ..Default::default()
    }
}

/// Resolves the full layered configuration for `repo_root`, with `cli`
/// supplying the highest-priority (CLI flag) layer.
pub fn resolve(repo_root: &Path, cli: PartialConfig) -> Result<Config, ConfigError> {
    let mut merged = PartialConfig::default();

    if let Some(global_path) = global_config_path() {
        merged = merged.overlay(load_layer(&global_path)?);
    }
    merged = merged.overlay(load_layer(&repo_config_path(repo_root))?);
    merged = merged.overlay(env_layer());
    merged = merged.overlay(cli);

    Ok(merged.into_config())
}

/// Writes `partial` to the per-repo `config.jsonc` file, creating `.lb/` if
/// needed.
pub fn save_repo_config(repo_root: &Path, partial: &PartialConfig) -> Result<(), ConfigError> {
    let lb = dirs::ensure_lb_dir(repo_root).map_err(|source| ConfigError::Write {
        path: dirs::lb_dir(repo_root).display().to_string(),
        source,
    })?;
    let path = lb.join("config.jsonc");
    let body = serde_json::to_string_pretty(partial).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(&path, body).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Writes `partial` to the global `~/.config/lb/config.jsonc`, creating the
/// directory and setting mode 0600 since it may carry `api_key` (§4.2).
pub fn save_global_config(partial: &PartialConfig) -> Result<(), ConfigError> {
    let dir = global_config_dir_or_err()?;
    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::Write {
        path: dir.display().to_string(),
        source,
    })?;
    let path = dir.join("config.jsonc");
    let body = serde_json::to_string_pretty(partial).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    std::fs::write(&path, body).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(&path, perms);
    }

    Ok(())
}

fn global_config_dir_or_err() -> Result<std::path::PathBuf, ConfigError> {
    dirs::global_config_dir().ok_or_else(|| ConfigError::Write {
        path: "~/.config/lb".to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = resolve(dir.path(), PartialConfig::default()).unwrap();
        assert_eq!(cfg.cache_ttl_seconds, 120);
        assert_eq!(cfg.repo_scope, RepoScope::Label);
        assert!(!cfg.local_only);
    }

    #[test]
    fn cli_overrides_repo_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".lb")).unwrap();
        std::fs::write(
            dir.path().join(".lb/config.jsonc"),
            r#"{ "team_key": "from-repo-file", "cache_ttl_seconds": 60 }"#,
        )
        .unwrap();

        let cli = PartialConfig {
            team_key: Some("from-cli".to_string()),
            ..Default::default()
        };
        let cfg = resolve(dir.path(), cli).unwrap();
        assert_eq!(cfg.team_key.as_deref(), Some("from-cli"));
        assert_eq!(cfg.cache_ttl_seconds, 60);
    }

    #[test]
    fn jsonc_comments_are_stripped() {
        let input = r#"{
            // a comment
            "team_key": "abc", /* inline */ "local_only": true
        }"#;
        let stripped = strip_jsonc_comments(input);
        let parsed: PartialConfig = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed.team_key.as_deref(), Some("abc"));
        assert_eq!(parsed.local_only, Some(true));
    }

    #[test]
    fn jsonc_comment_markers_inside_strings_are_preserved() {
        let input = r#"{ "repo_name": "not//acomment" }"#;
        let stripped = strip_jsonc_comments(input);
        let parsed: PartialConfig = serde_json::from_str(&stripped).unwrap();
        assert_eq!(parsed.repo_name.as_deref(), Some("not//acomment"));
    }

    #[test]
    fn json_fallback_when_no_jsonc() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".lb")).unwrap();
        std::fs::write(
            dir.path().join(".lb/config.json"),
            r#"{ "team_key": "abc" }"#,
        )
        .unwrap();

        let cfg = resolve(dir.path(), PartialConfig::default()).unwrap();
        assert_eq!(cfg.team_key.as_deref(), Some("abc"));
    }
}
