//! Service ids from `*.services.yml`, offered inside container lookups.

use crate::context::CompletionRequest;
use crate::error::ProviderError;
use crate::routing::file_module_name;
use crate::Provider;
use drupal_lsp_index::{DrupalWorkspace, FileCache, FilePattern, WatchedCache};
use drupal_lsp_parser::yaml::service_names;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use std::sync::Arc;

pub const SERVICES_PATTERN: &str =
    "web/{core,core/modules/*,modules/contrib/*,modules/custom/*}/*.services.yml";

const SERVICE_TRIGGERS: &[&str] = &["Drupal::service(", "$container->get(", "$container->getDefinition("];

pub struct ServicesProvider {
    workspace: Arc<DrupalWorkspace>,
    cache: FileCache<Completion>,
}

impl ServicesProvider {
    pub fn new(workspace: Arc<DrupalWorkspace>) -> Result<Self, ProviderError> {
        let cache = FileCache::new(FilePattern::new(SERVICES_PATTERN)?, |path, source| {
            let module = file_module_name(path, ".services.yml");
            Ok(service_names(source)?
                .into_iter()
                .map(|name| {
                    Completion::new(format!("{}.{}", module, name), CompletionKind::Class)
                        .with_detail("Service")
                })
                .collect())
        });
        Ok(ServicesProvider { workspace, cache })
    }
}

impl Provider for ServicesProvider {
    fn name(&self) -> &'static str {
        "services"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if request.language != LanguageId::Php
            || !self.workspace.has_file(&request.path)
            || !SERVICE_TRIGGERS
                .iter()
                .any(|t| request.line_prefix.contains(t))
        {
            return vec![];
        }
        self.cache.items().to_vec()
    }

    fn cache(&self) -> Option<&dyn WatchedCache> {
        Some(&self.cache)
    }
}
