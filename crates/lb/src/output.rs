//! Dual-mode (JSON / human) formatting for issues and tables.

use lb_core::enums::Status;
use lb_core::issue::Issue;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(body) => println!("{body}"),
        Err(e) => eprintln!("error: failed to serialize output: {e}"),
    }
}

pub fn status_symbol(status: &Status) -> &'static str {
    match status {
        Status::Open => "o",
        Status::InProgress => "~",
        Status::Closed => "x",
        Status::Unknown(_) => "?",
    }
}

fn status_colored(status: &Status) -> String {
    let label = status.as_str();
    match status {
        Status::Open => label.green().to_string(),
        Status::InProgress => label.yellow().to_string(),
        Status::Closed => label.dimmed().to_string(),
        Status::Unknown(_) => label.red().to_string(),
    }
}

/// One line per issue: `id [status] Ptitle  assignee`.
pub fn format_issue_row(issue: &Issue) -> String {
    let assignee = if issue.assignee.is_empty() { "-".to_string() } else { issue.assignee.clone() };
    format!(
        "{:<12} {} P{} {:<50} {}",
        issue.id.bold(),
        status_colored(&issue.status),
        issue.priority,
        issue.title,
        assignee,
    )
}

pub fn format_issue_detail(issue: &Issue) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", issue.id.bold(), issue.title));
    out.push_str(&format!("  status:     {}\n", status_colored(&issue.status)));
    out.push_str(&format!("  priority:   P{}\n", issue.priority));
    if let Some(t) = &issue.issue_type {
        out.push_str(&format!("  type:       {}\n", t.as_str()));
    }
    if !issue.assignee.is_empty() {
        out.push_str(&format!("  assignee:   {}\n", issue.assignee));
    }
    out.push_str(&format!("  created:    {}\n", issue.created_at.to_rfc3339()));
    out.push_str(&format!("  updated:    {}\n", issue.updated_at.to_rfc3339()));
    if let Some(closed) = issue.closed_at {
        out.push_str(&format!("  closed:     {}\n", closed.to_rfc3339()));
    }
    if !issue.description.is_empty() {
        out.push_str(&format!("\n{}\n", issue.description));
    }
    out
}

pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no issues)");
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let header_line: Vec<String> = headers.iter().enumerate().map(|(i, h)| format!("{:<width$}", h, width = widths[i])).collect();
    println!("{}", header_line.join("  ").bold());

    for row in rows {
        let line: Vec<String> = row.iter().enumerate().map(|(i, c)| format!("{:<width$}", c, width = widths.get(i).copied().unwrap_or(0))).collect();
        println!("{}", line.join("  "));
    }
}
