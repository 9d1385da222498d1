//! Extract hook definitions (`function hook_*`) from Drupal API files.

use crate::php::{doc_comment_before, node_text};
use crate::phpdoc::doc_summary;
use tree_sitter::{Node, Tree};

/// A `hook_*` function declared at the top level of a PHP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookDefinition {
    /// Hook name, e.g. `hook_form_alter`.
    pub name: String,
    /// Declaration source from `function` up to (not including) the body.
    pub signature: String,
    /// Parameter source texts with leading namespace qualifiers removed.
    pub params: Vec<String>,
    /// Doc-comment summary, when the function has a `/** */` comment.
    pub summary: Option<String>,
    /// Whether a doc comment was present at all.
    pub documented: bool,
}

/// Extract every top-level `hook_*` function from a parsed PHP file.
pub fn extract_hooks(tree: &Tree, source: &str) -> Vec<HookDefinition> {
    let root = tree.root_node();
    let mut hooks = Vec::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() != "function_definition" {
            continue;
        }
        if let Some(hook) = extract_hook(child, source) {
            hooks.push(hook);
        }
    }

    hooks
}

fn extract_hook(node: Node, source: &str) -> Option<HookDefinition> {
    let name = node_text(node.child_by_field_name("name")?, source);
    if !name.starts_with("hook_") {
        return None;
    }

    let signature_end = node
        .child_by_field_name("body")
        .map(|b| b.start_byte())
        .unwrap_or_else(|| node.end_byte());
    let signature = source[node.start_byte()..signature_end].trim_end().to_string();

    let mut params = Vec::new();
    if let Some(list) = node.child_by_field_name("parameters") {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            if param.kind() == "comment" {
                continue;
            }
            params.push(strip_namespace(node_text(param, source)));
        }
    }

    let doc = doc_comment_before(node, source);

    Some(HookDefinition {
        name: name.to_string(),
        signature,
        params,
        summary: doc.and_then(doc_summary),
        documented: doc.is_some(),
    })
}

/// Reduce a leading fully-qualified type to its last segment:
/// `\Drupal\Core\Form\FormStateInterface $fs` becomes `FormStateInterface $fs`.
pub fn strip_namespace(param: &str) -> String {
    if !param.starts_with('\\') {
        return param.to_string();
    }
    let end = param
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '\\'))
        .unwrap_or(param.len());
    let qualified = &param[..end];
    let short = qualified.rsplit('\\').next().unwrap_or(qualified);
    format!("{}{}", short, &param[end..])
}
