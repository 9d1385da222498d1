//! Drupal's Twig functions and filters, documented lazily from the PHP
//! methods implementing them.

use crate::context::{inside_twig_expression, CompletionRequest};
use crate::Provider;
use drupal_lsp_index::DrupalWorkspace;
use drupal_lsp_parser::class::{extract_class_outline, ClassOutline};
use drupal_lsp_parser::php::parse_php;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const TWIG_EXTENSION: &str = "\\Drupal\\Core\\Template\\TwigExtension";

struct TwigSymbol {
    label: &'static str,
    insert: &'static str,
    /// `Class` is relative to [`TWIG_EXTENSION`]'s namespace unless fully qualified.
    callback: &'static str,
}

const FUNCTIONS: &[TwigSymbol] = &[
    TwigSymbol { label: "render_var", insert: "render_var(${1:any})", callback: "TwigExtension::renderVar" },
    TwigSymbol { label: "url", insert: "url(${1:name})", callback: "TwigExtension::getUrl" },
    TwigSymbol { label: "path", insert: "path('${1:name}')", callback: "TwigExtension::getPath" },
    TwigSymbol { label: "link", insert: "link(${1:text}, ${2:uri})", callback: "TwigExtension::getLink" },
    TwigSymbol { label: "file_url", insert: "file_url(${1:path})", callback: "TwigExtension::getFileUrl" },
    TwigSymbol { label: "attach_library", insert: "attach_library('${1:library}')", callback: "TwigExtension::attachLibrary" },
    TwigSymbol { label: "active_theme_path", insert: "active_theme_path()", callback: "TwigExtension::getActiveThemePath" },
    TwigSymbol { label: "active_theme", insert: "active_theme()", callback: "TwigExtension::getActiveTheme" },
    TwigSymbol { label: "create_attribute", insert: "create_attribute(${1:attributes})", callback: "TwigExtension::createAttribute" },
    TwigSymbol { label: "dump", insert: "dump(${1:any})", callback: "\\Drupal\\Core\\Template\\DebugExtension::dump" },
];

const FILTERS: &[TwigSymbol] = &[
    TwigSymbol { label: "placeholder", insert: "placeholder", callback: "TwigExtension::escapePlaceholder" },
    TwigSymbol { label: "drupal_escape", insert: "drupal_escape", callback: "TwigExtension::escapeFilter" },
    TwigSymbol { label: "safe_join", insert: "safe_join", callback: "TwigExtension::safeJoin" },
    TwigSymbol { label: "without", insert: "without", callback: "TwigExtension::withoutFilter" },
    TwigSymbol { label: "clean_class", insert: "clean_class", callback: "\\Drupal\\Component\\Utility\\Html::getClass" },
    TwigSymbol { label: "clean_id", insert: "clean_id", callback: "\\Drupal\\Component\\Utility\\Html::getId" },
    TwigSymbol { label: "render", insert: "render", callback: "TwigExtension::renderVar" },
    TwigSymbol { label: "format_date", insert: "format_date", callback: "\\Drupal\\Core\\Datetime\\DateFormatterInterface::format" },
    TwigSymbol { label: "add_suggestion", insert: "add_suggestion", callback: "TwigExtension::suggestThemeHook" },
];

impl TwigSymbol {
    /// Fully qualified `\Namespace\Class::method`.
    fn callback(&self) -> String {
        if self.callback.starts_with('\\') {
            self.callback.to_string()
        } else {
            let namespace = TWIG_EXTENSION.trim_end_matches("TwigExtension");
            format!("{}{}", namespace, self.callback)
        }
    }
}

pub struct TwigProvider {
    workspace: Arc<DrupalWorkspace>,
    /// Absolute class file path → parsed method summaries.
    outlines: Mutex<HashMap<PathBuf, Arc<ClassOutline>>>,
}

impl TwigProvider {
    pub fn new(workspace: Arc<DrupalWorkspace>) -> Self {
        TwigProvider {
            workspace,
            outlines: Mutex::new(HashMap::new()),
        }
    }

    fn item(&self, symbol: &TwigSymbol, detail: &str, snippet: String) -> Completion {
        let mut item = Completion::new(symbol.label, CompletionKind::Function)
            .with_detail(detail)
            .with_snippet(snippet);
        item.data = Some(json!({
            "root": self.workspace.root().to_string_lossy(),
            "callback": symbol.callback(),
        }));
        item
    }

    /// Whether `item` came from this provider's workspace.
    pub fn owns(&self, item: &Completion) -> bool {
        let root = self.workspace.root().to_string_lossy();
        item.data
            .as_ref()
            .and_then(|d| d.get("root"))
            .and_then(|r| r.as_str())
            .is_some_and(|r| r == root)
    }

    /// Fill in the documentation of an item from its callback's doc comment.
    pub fn resolve(&self, mut item: Completion) -> Completion {
        if item.documentation.is_some() {
            return item;
        }
        let Some(callback) = item
            .data
            .as_ref()
            .and_then(|d| d.get("callback"))
            .and_then(|c| c.as_str())
        else {
            return item;
        };
        let Some((class, method)) = callback.split_once("::") else {
            return item;
        };
        let Some(outline) = self.outline(class) else {
            return item;
        };
        if let Some(summary) = outline.method_summary(method) {
            item.documentation = Some(summary.to_string());
        }
        item
    }

    /// `<root>/web/core/lib/Drupal/Core/Template/TwigExtension.php` for
    /// `\Drupal\Core\Template\TwigExtension`.
    fn class_path(&self, class: &str) -> PathBuf {
        let mut path = self.workspace.root().join("web/core/lib");
        for part in class.trim_start_matches('\\').split('\\') {
            path.push(part);
        }
        path.set_extension("php");
        path
    }

    fn outline(&self, class: &str) -> Option<Arc<ClassOutline>> {
        let path = self.class_path(class);
        if let Some(outline) = self.outlines.lock().get(&path) {
            return Some(outline.clone());
        }

        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!("No Twig callback source at {}: {}", path.display(), e);
                return None;
            }
        };
        let tree = match parse_php(&source) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                return None;
            }
        };
        let outline = Arc::new(extract_class_outline(&tree, &source));
        self.outlines.lock().insert(path, outline.clone());
        Some(outline)
    }
}

impl Provider for TwigProvider {
    fn name(&self) -> &'static str {
        "twig"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        if request.language != LanguageId::Twig || !self.workspace.has_file(&request.path) {
            return vec![];
        }

        let wrap = !inside_twig_expression(&request.line_prefix);
        let mut items: Vec<Completion> = FUNCTIONS
            .iter()
            .map(|f| {
                let snippet = if wrap {
                    format!("{{{{ {} }}}}", f.insert)
                } else {
                    f.insert.to_string()
                };
                self.item(f, "function (Drupal)", snippet)
            })
            .collect();

        if request.line_prefix.contains('|') {
            items.extend(
                FILTERS
                    .iter()
                    .map(|f| self.item(f, "filter (Drupal)", f.insert.to_string())),
            );
        }
        items
    }
}
