//! Hook implementation stubs from `hook_*` functions in API files.

use crate::context::{escape_snippet, is_declaration_position, CompletionRequest};
use crate::error::ProviderError;
use crate::Provider;
use drupal_lsp_index::module::module_machine_name;
use drupal_lsp_index::{DrupalWorkspace, FileCache, FilePattern, WatchedCache};
use drupal_lsp_parser::hooks::{extract_hooks, HookDefinition};
use drupal_lsp_parser::php::parse_php;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use std::sync::Arc;

pub const HOOK_PATTERN: &str =
    "web/{core,core/modules/*,modules/contrib/*,modules/custom/*}/*.{api.php,module,theme}";

const HOOK_PREFIX: &str = "function hook_";

/// Completion item for one hook definition.
pub fn hook_completion(hook: &HookDefinition) -> Completion {
    let snippet = format!(
        "/**\n * Implements {}().\n */\n{} {{\n\t$0\n}}",
        hook.name,
        escape_snippet(&hook.signature)
    );
    let mut item = Completion::new(&hook.name, CompletionKind::Function)
        .with_detail(format!("Implements {}", hook.name))
        .with_snippet(snippet);

    if hook.documented {
        item = item.with_documentation(format!(
            "```php\n<?php\nfunction {}({}) {{}}\n```\n{}",
            hook.name,
            hook.params.join(", "),
            hook.summary.as_deref().unwrap_or_default()
        ));
    }
    item
}

/// Copy of `item` with the stub renamed for module `machine_name`.
pub fn specialize(item: &Completion, machine_name: &str) -> Completion {
    item.specialized(HOOK_PREFIX, &format!("function {}_", machine_name))
}

pub struct HookProvider {
    workspace: Arc<DrupalWorkspace>,
    cache: FileCache<Completion>,
}

impl HookProvider {
    pub fn new(workspace: Arc<DrupalWorkspace>) -> Result<Self, ProviderError> {
        let cache = FileCache::new(FilePattern::new(HOOK_PATTERN)?, |_path, source| {
            let tree = parse_php(source)?;
            Ok(extract_hooks(&tree, source)
                .iter()
                .map(hook_completion)
                .collect())
        });
        Ok(HookProvider { workspace, cache })
    }
}

impl Provider for HookProvider {
    fn name(&self) -> &'static str {
        "hook"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if request.language != LanguageId::Php || !is_declaration_position(&request.line_prefix)
        {
            return vec![];
        }

        let items = self.cache.items();
        match module_machine_name(&request.path, self.workspace.root()) {
            Some(machine_name) => items.iter().map(|i| specialize(i, &machine_name)).collect(),
            None => items.to_vec(),
        }
    }

    fn cache(&self) -> Option<&dyn WatchedCache> {
        Some(&self.cache)
    }
}
