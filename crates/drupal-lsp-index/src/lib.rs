//! Workspace model for drupal-lsp.
//!
//! Detects Drupal projects from composer manifests, resolves glob patterns
//! relative to a project root, derives module context from file paths and
//! keeps the per-file completion caches that providers are built on.

pub mod cache;
pub mod composer;
pub mod error;
pub mod locator;
pub mod module;
pub mod pattern;
pub mod settings;
pub mod workspace;

pub use cache::{CacheStatus, FileCache, FileEvent, WatchedCache};
pub use error::IndexError;
pub use pattern::FilePattern;
pub use workspace::{DrupalWorkspace, WorkspaceId};
