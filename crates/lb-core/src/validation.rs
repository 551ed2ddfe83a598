//! Eager validation (§4.6): "unknown status, priority out of range, unknown
//! type, malformed `--deps`" are reported before any cache or queue
//! mutation.

use thiserror::Error;

use crate::enums::{DependencyType, IssueType, Status};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title exceeds maximum length of {max} characters")]
    TitleTooLong { max: usize },

    #[error("priority {0} out of range; expected 0..4")]
    InvalidPriority(i32),

    #[error("unknown status {0:?}; expected one of open, in_progress, closed")]
    InvalidStatus(String),

    #[error("unknown issue type {0:?}")]
    InvalidIssueType(String),

    #[error("unknown dependency type {0:?}")]
    InvalidDependencyType(String),

    #[error("malformed --deps entry {0:?}; expected type:ID")]
    MalformedDeps(String),

    #[error("issue is closed but closed_at is not set")]
    ClosedWithoutTimestamp,

    #[error("issue is not closed but closed_at is set")]
    NotClosedWithTimestamp,
}

const MAX_TITLE_LEN: usize = 500;

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong { max: MAX_TITLE_LEN });
    }
    Ok(())
}

pub fn validate_priority(priority: i32) -> Result<(), ValidationError> {
    if !(0..=4).contains(&priority) {
        return Err(ValidationError::InvalidPriority(priority));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<Status, ValidationError> {
    let parsed = Status::from(status);
    if parsed.is_known() {
        Ok(parsed)
    } else {
        Err(ValidationError::InvalidStatus(status.to_string()))
    }
}

pub fn validate_issue_type(issue_type: &str) -> Result<IssueType, ValidationError> {
    let parsed = IssueType::from(issue_type);
    if parsed.is_known() {
        Ok(parsed)
    } else {
        Err(ValidationError::InvalidIssueType(issue_type.to_string()))
    }
}

pub fn validate_closed_at(status: &Status, closed_at_is_set: bool) -> Result<(), ValidationError> {
    match (status, closed_at_is_set) {
        (Status::Closed, false) => Err(ValidationError::ClosedWithoutTimestamp),
        (Status::Closed, true) => Ok(()),
        (_, true) => Err(ValidationError::NotClosedWithTimestamp),
        (_, false) => Ok(()),
    }
}

/// Parses one entry of the legacy comma-separated `--deps` flag, `type:ID`
/// (§4.7).
pub fn parse_deps_entry(entry: &str) -> Result<(DependencyType, String), ValidationError> {
    let (type_str, id) = entry
        .split_once(':')
        .ok_or_else(|| ValidationError::MalformedDeps(entry.to_string()))?;
    if id.trim().is_empty() {
        return Err(ValidationError::MalformedDeps(entry.to_string()));
    }
    let dep_type = DependencyType::from(type_str);
    if !dep_type.is_known() {
        return Err(ValidationError::InvalidDependencyType(type_str.to_string()));
    }
    Ok((dep_type, id.trim().to_string()))
}

/// Parses the full legacy `--deps type:ID,type:ID,...` flag value.
pub fn parse_deps(value: &str) -> Result<Vec<(DependencyType, String)>, ValidationError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_deps_entry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_required() {
        assert_eq!(validate_title(""), Err(ValidationError::TitleRequired));
        assert_eq!(validate_title("   "), Err(ValidationError::TitleRequired));
        assert!(validate_title("ok").is_ok());
    }

    #[test]
    fn priority_range() {
        for p in 0..=4 {
            assert!(validate_priority(p).is_ok());
        }
        assert!(validate_priority(-1).is_err());
        assert!(validate_priority(5).is_err());
    }

    #[test]
    fn status_rejects_unknown() {
        assert!(validate_status("open").is_ok());
        assert!(validate_status("blorp").is_err());
    }

    #[test]
    fn issue_type_rejects_unknown() {
        assert!(validate_issue_type("bug").is_ok());
        assert!(validate_issue_type("nonsense").is_err());
    }

    #[test]
    fn deps_parses_multiple_entries() {
        let parsed = parse_deps("blocks:TEAM-1, related:TEAM-2").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], (DependencyType::Blocks, "TEAM-1".to_string()));
        assert_eq!(parsed[1], (DependencyType::Related, "TEAM-2".to_string()));
    }

    #[test]
    fn deps_rejects_malformed_entry() {
        assert!(parse_deps_entry("TEAM-1").is_err());
        assert!(parse_deps_entry("blocks:").is_err());
    }

    #[test]
    fn closed_at_invariant() {
        assert!(validate_closed_at(&Status::Closed, true).is_ok());
        assert!(validate_closed_at(&Status::Closed, false).is_err());
        assert!(validate_closed_at(&Status::Open, false).is_ok());
        assert!(validate_closed_at(&Status::Open, true).is_err());
    }
}
