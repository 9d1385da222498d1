//! Global variables documented in core's `globals.api.php`.

use crate::context::{variable_prefix, CompletionRequest};
use crate::error::ProviderError;
use crate::Provider;
use drupal_lsp_index::{DrupalWorkspace, FileCache, FilePattern, WatchedCache};
use drupal_lsp_parser::globals::extract_globals;
use drupal_lsp_parser::php::parse_php;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use std::sync::Arc;

pub const GLOBALS_PATTERN: &str = "web/core/globals.api.php";

pub struct GlobalsProvider {
    workspace: Arc<DrupalWorkspace>,
    cache: FileCache<Completion>,
}

impl GlobalsProvider {
    pub fn new(workspace: Arc<DrupalWorkspace>) -> Result<Self, ProviderError> {
        let cache = FileCache::new(FilePattern::new(GLOBALS_PATTERN)?, |_path, source| {
            let tree = parse_php(source)?;
            Ok(extract_globals(&tree, source)
                .into_iter()
                .map(|global| {
                    let item = Completion::new(global.name, CompletionKind::Variable)
                        .with_detail("global variable");
                    match global.summary {
                        Some(summary) => item.with_documentation(summary),
                        None => item,
                    }
                })
                .collect())
        });
        Ok(GlobalsProvider { workspace, cache })
    }
}

impl Provider for GlobalsProvider {
    fn name(&self) -> &'static str {
        "globals"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if request.language != LanguageId::Php
            || !self.workspace.has_file(&request.path)
            || variable_prefix(&request.line_prefix).is_none()
        {
            return vec![];
        }
        self.cache.items().to_vec()
    }

    fn cache(&self) -> Option<&dyn WatchedCache> {
        Some(&self.cache)
    }
}
