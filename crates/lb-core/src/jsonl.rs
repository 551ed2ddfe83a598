//! JSONL reading/writing (§4.9, §6.3): one compact JSON object per line.
//!
//! [`ExportRow`] is the canonical snapshot's line shape -- a view over
//! [`Issue`](crate::issue::Issue) plus its dependencies, not the raw cached
//! struct, so that the JSONL file carries exactly the fields named in §6.3
//! and nothing else.

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::Dependency;
use crate::enums::{IssueType, Status};
use crate::issue::Issue;

#[derive(Debug, Error)]
pub enum JsonlError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// One line of the canonical snapshot (§6.3). Fields beyond the always-on
/// set are omitted (never `null`) when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

impl ExportRow {
    pub fn from_issue(issue: &Issue, dependencies: Vec<Dependency>) -> Self {
        Self {
            id: issue.id.clone(),
            title: issue.title.clone(),
            status: issue.status.clone(),
            priority: issue.priority,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            issue_type: issue.issue_type.clone(),
            description: if issue.description.is_empty() {
                None
            } else {
                Some(issue.description.clone())
            },
            closed_at: issue.closed_at,
            dependencies,
        }
    }
}

/// Serializes `rows` as JSONL, one compact object per line, flushing at the
/// end. Callers are responsible for sorting `rows` ascending by `id` first
/// (§4.9, §6.3) -- this function preserves input order.
pub fn write_jsonl<W: Write>(writer: &mut W, rows: &[ExportRow]) -> Result<(), JsonlError> {
    for row in rows {
        serde_json::to_writer(&mut *writer, row).map_err(|source| JsonlError::Json {
            line: 0,
            source,
        })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Streaming JSONL reader. Skips blank lines; reports the 1-based line
/// number on a parse error.
pub struct JsonlIter<R> {
    reader: R,
    line_number: usize,
}

pub fn read_jsonl<R: BufRead>(reader: R) -> JsonlIter<R> {
    JsonlIter {
        reader,
        line_number: 0,
    }
}

impl<R: BufRead> Iterator for JsonlIter<R> {
    type Item = Result<ExportRow, JsonlError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    return Some(serde_json::from_str(trimmed).map_err(|source| {
                        JsonlError::Json {
                            line: self.line_number,
                            source,
                        }
                    }));
                }
                Err(e) => return Some(Err(JsonlError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_row(id: &str) -> ExportRow {
        let issue = Issue::builder("Title").id(id).build();
        ExportRow::from_issue(&issue, vec![])
    }

    #[test]
    fn write_and_read_roundtrip() {
        let rows = vec![sample_row("TEAM-1"), sample_row("TEAM-2")];
        let mut buf = Vec::new();
        write_jsonl(&mut buf, &rows).unwrap();

        let read_back: Vec<ExportRow> = read_jsonl(Cursor::new(buf))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(read_back, rows);
    }

    #[test]
    fn read_skips_empty_lines() {
        let data = "\n\n{\"id\":\"A\",\"title\":\"t\",\"status\":\"open\",\"priority\":2,\"created_at\":\"2024-01-01T00:00:00Z\",\"updated_at\":\"2024-01-01T00:00:00Z\"}\n\n";
        let rows: Vec<ExportRow> = read_jsonl(Cursor::new(data))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn read_reports_line_number_on_error() {
        let data = "{\"ok\":true, \"id\":\"A\"}\nnot json\n";
        let results: Vec<_> = read_jsonl(Cursor::new(data)).collect();
        assert!(results[0].is_err());
        match &results[0] {
            Err(JsonlError::Json { line, .. }) => assert_eq!(*line, 1),
            other => panic!("expected Json error, got {other:?}"),
        }
    }

    #[test]
    fn never_emits_null_optional_fields() {
        let row = sample_row("TEAM-1");
        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("null"));
    }
}
