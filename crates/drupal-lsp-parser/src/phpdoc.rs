//! PHPDoc comment parser.
//!
//! Extracts the summary paragraph from PHPDoc comments. Drupal API files
//! document hooks with a one-paragraph summary followed by prose and
//! `@param`/`@return`/`@see` tags.

/// Structured view of a PHPDoc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    /// First paragraph, joined into one line.
    pub summary: Option<String>,
}

/// Parse a PHPDoc comment string into structured data.
///
/// Expects the full comment including `/**` and `*/`.
pub fn parse_phpdoc(comment: &str) -> DocBlock {
    let mut doc = DocBlock::default();
    let mut summary_lines: Vec<String> = Vec::new();
    let mut in_summary = true;

    for line in strip_comment_markers(comment) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !summary_lines.is_empty() {
                in_summary = false;
            }
            continue;
        }

        if trimmed.starts_with('@') {
            in_summary = false;
        } else if in_summary {
            summary_lines.push(trimmed.to_string());
        }
    }

    if !summary_lines.is_empty() {
        doc.summary = Some(summary_lines.join(" "));
    }

    doc
}

/// Shorthand for the summary of a comment.
pub fn doc_summary(comment: &str) -> Option<String> {
    parse_phpdoc(comment).summary
}

/// Strip `/**`, `*/` and leading `*` markers. Blank lines are kept so that
/// paragraph breaks survive.
fn strip_comment_markers(comment: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for line in comment.lines() {
        let trimmed = line.trim();
        let mut stripped = if let Some(rest) = trimmed.strip_prefix("/**") {
            rest.trim()
        } else if trimmed.starts_with("*/") {
            continue;
        } else if let Some(rest) = trimmed.strip_prefix('*') {
            rest.trim_start()
        } else {
            trimmed
        };
        if let Some(rest) = stripped.strip_suffix("*/") {
            stripped = rest.trim_end();
        }
        lines.push(stripped.to_string());
    }
    lines
}
