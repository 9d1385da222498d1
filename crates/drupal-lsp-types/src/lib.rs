//! Shared types for drupal-lsp.
//!
//! Contains completion items, document languages, tool diagnostics and task
//! descriptors used across parser, index, completion and server crates.

use serde::{Deserialize, Serialize};

/// Category of a completion item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionKind {
    Function,
    Keyword,
    Class,
    Variable,
    Text,
}

/// How the insert text of a completion should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InsertFormat {
    #[default]
    PlainText,
    /// Snippet syntax with `$1`, `${1:name}` and `$0` tab stops.
    Snippet,
}

/// A completion suggestion extracted from a workspace file or a static table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Text shown in the completion list (the symbol name).
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
    /// Markdown documentation.
    pub documentation: Option<String>,
    pub insert_text: Option<String>,
    pub insert_format: InsertFormat,
    /// Text matched against what the user typed, when it differs from the label.
    pub filter_text: Option<String>,
    /// Range replaced by the insert text (start line, start col, end line, end col).
    pub replace_range: Option<(u32, u32, u32, u32)>,
    /// Opaque payload round-tripped through lazy resolution.
    pub data: Option<serde_json::Value>,
}

impl Completion {
    /// Create a completion with only a label and kind.
    pub fn new(label: impl Into<String>, kind: CompletionKind) -> Self {
        Completion {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            insert_format: InsertFormat::PlainText,
            filter_text: None,
            replace_range: None,
            data: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.insert_text = Some(snippet.into());
        self.insert_format = InsertFormat::Snippet;
        self
    }

    /// Return a copy with `search` replaced by `replacement` (first occurrence)
    /// in the insert text and documentation. The receiver is left untouched.
    pub fn specialized(&self, search: &str, replacement: &str) -> Completion {
        let mut item = self.clone();
        if let Some(text) = &mut item.insert_text {
            *text = text.replacen(search, replacement, 1);
        }
        if let Some(doc) = &mut item.documentation {
            *doc = doc.replacen(search, replacement, 1);
        }
        item
    }
}

/// Language of an open document, from the client's `languageId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageId {
    Php,
    JavaScript,
    Yaml,
    Twig,
    Other,
}

impl LanguageId {
    pub fn from_language_id(id: &str) -> Self {
        match id {
            "php" => LanguageId::Php,
            "javascript" | "javascriptreact" => LanguageId::JavaScript,
            "yaml" => LanguageId::Yaml,
            "twig" | "html.twig" => LanguageId::Twig,
            _ => LanguageId::Other,
        }
    }
}

/// Severity of a diagnostic reported by an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A diagnostic produced from external tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDiagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    /// Range in the document (start line, start col, end line, end col).
    pub range: (u32, u32, u32, u32),
    /// Source tag, e.g. "Drupal: phpcs".
    pub source: String,
}

/// An invocable task sourced from an external CLI listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    pub detail: Option<String>,
    /// Shell command line that runs the task from the workspace root.
    pub command: String,
}
