//! Route names from `*.routing.yml`, offered inside route-taking calls.

use crate::context::CompletionRequest;
use crate::error::ProviderError;
use crate::Provider;
use drupal_lsp_index::{DrupalWorkspace, FileCache, FilePattern, WatchedCache};
use drupal_lsp_parser::yaml::route_names;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

pub const ROUTING_PATTERN: &str =
    "web/{core/modules,modules/contrib,modules/custom}/*/*.routing.yml";

/// Line prefixes (end-anchored) that expect a route name next.
const ROUTE_TRIGGERS: &[&str] = &[
    r#"Link::createFromRoute\(['"].*['"], ['"]$"#,
    r#"Url::fromRoute\(['"]$"#,
    r#"new Url\(['"]$"#,
];

pub struct RoutingProvider {
    workspace: Arc<DrupalWorkspace>,
    cache: FileCache<Completion>,
    triggers: Vec<Regex>,
}

impl RoutingProvider {
    pub fn new(workspace: Arc<DrupalWorkspace>) -> Result<Self, ProviderError> {
        let triggers = ROUTE_TRIGGERS
            .iter()
            .map(|t| Regex::new(t))
            .collect::<Result<Vec<_>, _>>()?;
        let cache = FileCache::new(FilePattern::new(ROUTING_PATTERN)?, route_completions);
        Ok(RoutingProvider {
            workspace,
            cache,
            triggers,
        })
    }

    fn triggered(&self, line_prefix: &str) -> bool {
        self.triggers.iter().any(|t| t.is_match(line_prefix))
    }
}

fn route_completions(
    path: &Path,
    source: &str,
) -> Result<Vec<Completion>, drupal_lsp_parser::ParseError> {
    let module = file_module_name(path, ".routing.yml");
    Ok(route_names(source)?
        .into_iter()
        .map(|name| {
            Completion::new(name, CompletionKind::Keyword).with_detail(format!("Route {}", module))
        })
        .collect())
}

/// `a` for `.../a.routing.yml` when `suffix` is `.routing.yml`.
pub(crate) fn file_module_name<'a>(path: &'a Path, suffix: &str) -> &'a str {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    name.strip_suffix(suffix).unwrap_or(name)
}

impl Provider for RoutingProvider {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if request.language != LanguageId::Php
            || !self.workspace.has_file(&request.path)
            || !self.triggered(&request.line_prefix)
        {
            return vec![];
        }
        self.cache.items().to_vec()
    }

    fn cache(&self) -> Option<&dyn WatchedCache> {
        Some(&self.cache)
    }
}
