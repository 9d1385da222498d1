//! Completion request and the line-prefix heuristics providers trigger on.

use drupal_lsp_types::LanguageId;
use std::path::PathBuf;

/// A completion query at a cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Absolute path of the requesting document.
    pub path: PathBuf,
    pub language: LanguageId,
    /// Text of the cursor line up to the cursor.
    pub line_prefix: String,
    pub line: u32,
    /// Cursor column in UTF-16 code units.
    pub character: u32,
}

impl CompletionRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        language: LanguageId,
        line_prefix: impl Into<String>,
        line: u32,
    ) -> Self {
        let line_prefix = line_prefix.into();
        let character = utf16_len(&line_prefix);
        CompletionRequest {
            path: path.into(),
            language,
            line_prefix,
            line,
            character,
        }
    }

    /// File name of the requesting document.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// Whether the cursor sits where a top-level declaration can start: only
/// an identifier fragment, optionally after `function `, precedes it.
pub fn is_declaration_position(line_prefix: &str) -> bool {
    let trimmed = line_prefix.trim_start();
    let word = trimmed.strip_prefix("function ").unwrap_or(trimmed).trim_start();
    word.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Partial variable name when the cursor follows `$name`.
pub fn variable_prefix(line_prefix: &str) -> Option<&str> {
    let dollar = line_prefix.rfind('$')?;
    let name = &line_prefix[dollar + 1..];
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let preceded_by_word = line_prefix[..dollar]
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
    (!preceded_by_word).then_some(name)
}

/// Byte offset just past the last occurrence of any of `needles`.
pub fn end_of_last_match(line_prefix: &str, needles: &[&str]) -> Option<usize> {
    needles
        .iter()
        .filter_map(|needle| line_prefix.rfind(needle).map(|i| i + needle.len()))
        .max()
}

/// Quote opened after byte offset `from`, with its UTF-16 column.
pub fn open_quote_after(line_prefix: &str, from: usize) -> Option<(char, u32)> {
    let tail = line_prefix.get(from..)?;
    let (offset, quote) = tail
        .char_indices()
        .filter(|(_, c)| *c == '\'' || *c == '"')
        .last()?;
    let column = utf16_len(&line_prefix[..from + offset]);
    Some((quote, column))
}

pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// Whether a Twig `{{` expression is open at the cursor.
pub fn inside_twig_expression(line_prefix: &str) -> bool {
    match (line_prefix.rfind("{{"), line_prefix.rfind("}}")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Escape text for literal use inside snippet syntax.
pub fn escape_snippet(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '$' | '}') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
