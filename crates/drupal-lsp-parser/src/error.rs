//! Error types for source-file and tool-output parsing.

use thiserror::Error;

/// Failure to turn a single source file into structured data.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load tree-sitter PHP grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("tree-sitter produced no tree")]
    NoTree,

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid PO file at line {line}: {message}")]
    Po { line: usize, message: String },
}

/// Failure to interpret the output of an external tool.
#[derive(Debug, Error)]
pub enum ToolOutputError {
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output has no `{0}` section")]
    MissingSection(&'static str),
}
