//! Completion engine for drupal-lsp.
//!
//! Each provider answers completion requests for one kind of Drupal symbol
//! from data extracted out of workspace files. `WorkspaceProviders` bundles
//! the providers of one Drupal workspace.

pub mod context;
pub mod error;
pub mod globals;
pub mod hooks;
pub mod routing;
pub mod services;
pub mod translation;
pub mod twig;
pub mod workspace;

pub use context::CompletionRequest;
pub use error::ProviderError;
pub use workspace::WorkspaceProviders;

use drupal_lsp_index::WatchedCache;
use drupal_lsp_types::Completion;

/// A source of completion items for documents of one workspace.
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion>;

    /// The file cache feeding this provider, if it is file-driven.
    fn cache(&self) -> Option<&dyn WatchedCache> {
        None
    }
}
