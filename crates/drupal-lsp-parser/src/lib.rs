//! Source-file extractors for drupal-lsp.
//!
//! Wraps tree-sitter-php for hook, global variable and class method
//! extraction, and parses the YAML, gettext PO and tool output formats a
//! Drupal project produces.

pub mod class;
pub mod error;
pub mod globals;
pub mod hooks;
pub mod php;
pub mod phpdoc;
pub mod po;
pub mod tools;
pub mod yaml;

pub use error::{ParseError, ToolOutputError};
