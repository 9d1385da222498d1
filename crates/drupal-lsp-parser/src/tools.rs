//! Output parsers for the external PHP tooling (phpcs, phpstan, phpcbf, drush).
//!
//! Running the tools is the caller's business; these functions only turn
//! their reports into diagnostics, formatting edits and task descriptors.

use crate::error::ToolOutputError;
use drupal_lsp_types::{DiagnosticSeverity, TaskDescriptor, ToolDiagnostic};
use serde::Deserialize;
use serde_json::Value;

pub const PHPCS_SOURCE: &str = "Drupal: phpcs";
pub const PHPSTAN_SOURCE: &str = "Drupal: phpstan";

#[derive(Debug, Deserialize)]
struct PhpcsMessage {
    message: String,
    #[serde(rename = "type")]
    kind: String,
    line: u32,
    column: u32,
}

#[derive(Debug, Deserialize)]
struct PhpstanMessage {
    message: String,
    line: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DrushList {
    commands: Vec<DrushCommand>,
}

#[derive(Debug, Deserialize)]
struct DrushCommand {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hidden: bool,
}

/// Messages of `file_path` in a `{"files": {path: {"messages": [...]}}}` report.
///
/// Reports without problems may encode `files` as an empty JSON array.
fn file_messages<'a>(report: &'a Value, file_path: &str) -> Result<Option<&'a Value>, ToolOutputError> {
    let files = report
        .get("files")
        .ok_or(ToolOutputError::MissingSection("files"))?;
    Ok(files.get(file_path).and_then(|f| f.get("messages")))
}

/// Convert a `phpcs --report=json` report into diagnostics for `file_path`.
pub fn parse_phpcs_report(
    json: &str,
    file_path: &str,
) -> Result<Vec<ToolDiagnostic>, ToolOutputError> {
    let report: Value = serde_json::from_str(json)?;
    let Some(messages) = file_messages(&report, file_path)? else {
        return Ok(vec![]);
    };
    let messages: Vec<PhpcsMessage> = serde_json::from_value(messages.clone())?;

    Ok(messages
        .into_iter()
        .map(|m| {
            let line = m.line.saturating_sub(1);
            ToolDiagnostic {
                severity: if m.kind == "ERROR" {
                    DiagnosticSeverity::Error
                } else {
                    DiagnosticSeverity::Warning
                },
                message: m.message,
                range: (line, m.column, line, m.column),
                source: PHPCS_SOURCE.to_string(),
            }
        })
        .collect())
}

/// Convert a `phpstan analyse --error-format=json` report into diagnostics.
///
/// Each diagnostic spans the reported line from its first non-whitespace
/// character to its end, so `text` must be the analysed document.
pub fn parse_phpstan_report(
    json: &str,
    file_path: &str,
    text: &str,
) -> Result<Vec<ToolDiagnostic>, ToolOutputError> {
    let report: Value = serde_json::from_str(json)?;
    let Some(messages) = file_messages(&report, file_path)? else {
        return Ok(vec![]);
    };
    let messages: Vec<PhpstanMessage> = serde_json::from_value(messages.clone())?;
    let lines: Vec<&str> = text.lines().collect();

    Ok(messages
        .into_iter()
        .map(|m| {
            let line = m.line.unwrap_or(1).saturating_sub(1);
            let content = lines.get(line as usize).copied().unwrap_or("");
            let start = content.chars().take_while(|c| c.is_whitespace()).count() as u32;
            let end = content.chars().count() as u32;
            ToolDiagnostic {
                severity: DiagnosticSeverity::Error,
                message: m.message,
                range: (line, start, line, end),
                source: PHPSTAN_SOURCE.to_string(),
            }
        })
        .collect())
}

/// A whole-document replacement produced by a formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattingEdit {
    /// Range covering the entire original document.
    pub range: (u32, u32, u32, u32),
    pub new_text: String,
}

/// Whole-document edit from phpcbf's stdout, or `None` if nothing changed.
pub fn formatting_replacement(original: &str, formatted: &str) -> Option<FormattingEdit> {
    if formatted.is_empty() || original == formatted {
        return None;
    }
    let end_line = original.matches('\n').count() as u32;
    let last_line = original.rsplit('\n').next().unwrap_or("");
    Some(FormattingEdit {
        range: (0, 0, end_line, last_line.chars().count() as u32),
        new_text: formatted.to_string(),
    })
}

/// Turn `drush list --format=json` output into runnable tasks.
pub fn parse_drush_commands(
    json: &str,
    drush: &str,
) -> Result<Vec<TaskDescriptor>, ToolOutputError> {
    let list: DrushList = serde_json::from_str(json)?;
    Ok(list
        .commands
        .into_iter()
        .filter(|c| !c.hidden)
        .map(|c| TaskDescriptor {
            command: format!("{} {}", drush, c.name),
            name: c.name,
            detail: c.description.filter(|d| !d.is_empty()),
        })
        .collect())
}
