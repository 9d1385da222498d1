//! All providers of one Drupal workspace.

use crate::context::CompletionRequest;
use crate::error::ProviderError;
use crate::globals::GlobalsProvider;
use crate::hooks::HookProvider;
use crate::routing::RoutingProvider;
use crate::services::ServicesProvider;
use crate::translation::TranslationProvider;
use crate::twig::TwigProvider;
use crate::Provider;
use drupal_lsp_index::{CacheStatus, DrupalWorkspace, FileEvent, WorkspaceId};
use drupal_lsp_types::Completion;
use std::path::Path;
use std::sync::Arc;

const COMPOSER_LOCK: &str = "composer.lock";

/// Providers bound to one workspace. Dropping this releases every cache.
pub struct WorkspaceProviders {
    workspace: Arc<DrupalWorkspace>,
    providers: Vec<Box<dyn Provider>>,
    twig: TwigProvider,
}

impl WorkspaceProviders {
    /// Build the providers. Caches stay empty until [`populate`](Self::populate).
    pub fn new(workspace: DrupalWorkspace) -> Result<Self, ProviderError> {
        let workspace = Arc::new(workspace);
        let providers: Vec<Box<dyn Provider>> = vec![
            Box::new(HookProvider::new(workspace.clone())?),
            Box::new(RoutingProvider::new(workspace.clone())?),
            Box::new(ServicesProvider::new(workspace.clone())?),
            Box::new(GlobalsProvider::new(workspace.clone())?),
            Box::new(TranslationProvider::new()?),
        ];
        Ok(WorkspaceProviders {
            twig: TwigProvider::new(workspace.clone()),
            workspace,
            providers,
        })
    }

    pub fn id(&self) -> WorkspaceId {
        self.workspace.id()
    }

    pub fn workspace(&self) -> &Arc<DrupalWorkspace> {
        &self.workspace
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.workspace.has_file(path)
    }

    /// Initial scan of every file-driven provider.
    pub fn populate(&self) {
        for provider in &self.providers {
            if let Some(cache) = provider.cache() {
                cache.populate(&self.workspace);
            }
        }
        tracing::info!(
            "Drupal providers ready for {}",
            self.workspace.root().display()
        );
    }

    /// Workspace-relative globs to watch on the client.
    pub fn watch_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .providers
            .iter()
            .filter_map(|p| p.cache())
            .map(|c| c.pattern().as_str().to_string())
            .collect();
        patterns.push(COMPOSER_LOCK.to_string());
        patterns
    }

    /// `(provider name, cache status)` for every file-driven provider.
    pub fn cache_status(&self) -> Vec<(&'static str, CacheStatus)> {
        self.providers
            .iter()
            .filter_map(|p| p.cache().map(|c| (p.name(), c.status())))
            .collect()
    }

    /// Route a watched-file event to the caches whose pattern matches.
    pub fn on_file_event(&self, path: &Path, event: FileEvent) {
        if !self.has_file(path) {
            return;
        }
        if path == self.workspace.root().join(COMPOSER_LOCK) {
            self.workspace.invalidate_version();
            return;
        }
        for provider in &self.providers {
            let Some(cache) = provider.cache() else {
                continue;
            };
            if cache.pattern().matches(self.workspace.root(), path) {
                tracing::debug!("{:?} {} for {} provider", event, path.display(), provider.name());
                cache.apply(path, event);
            }
        }
    }

    /// Items of every provider for a request in this workspace.
    pub fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if !self.has_file(&request.path) {
            return vec![];
        }
        let mut items: Vec<Completion> = self
            .providers
            .iter()
            .flat_map(|p| p.complete(request))
            .collect();
        items.extend(self.twig.complete(request));
        items
    }

    /// Whether `item` was produced by this workspace and can be resolved here.
    pub fn owns(&self, item: &Completion) -> bool {
        self.twig.owns(item)
    }

    pub fn resolve(&self, item: Completion) -> Completion {
        self.twig.resolve(item)
    }

    /// api.drupal.org search URL for a symbol, for this site's core version.
    pub fn api_search_url(&self, symbol: &str) -> String {
        self.workspace.api_search_url(symbol)
    }
}
