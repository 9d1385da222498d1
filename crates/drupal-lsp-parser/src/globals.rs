//! Extract documented `global $name;` declarations (core's `globals.api.php`).

use crate::php::{doc_comment_before, node_text};
use crate::phpdoc::doc_summary;
use tree_sitter::Tree;

/// A global variable declared at the top level of a PHP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalVariable {
    /// Variable name including the leading `$`.
    pub name: String,
    pub summary: Option<String>,
}

/// Extract the first variable of every top-level `global` statement.
pub fn extract_globals(tree: &Tree, source: &str) -> Vec<GlobalVariable> {
    let root = tree.root_node();
    let mut globals = Vec::new();

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() != "global_declaration" {
            continue;
        }
        let mut inner = child.walk();
        let Some(variable) = child
            .named_children(&mut inner)
            .find(|n| n.kind() == "variable_name")
        else {
            continue;
        };

        globals.push(GlobalVariable {
            name: node_text(variable, source).to_string(),
            summary: doc_comment_before(child, source).and_then(doc_summary),
        });
    }

    globals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::php::parse_php;

    #[test]
    fn test_extract_documented_globals() {
        let source = "<?php\n/**\n * The base URL of the site.\n */\nglobal $base_url;\n\nglobal $config_directories;\n";
        let tree = parse_php(source).unwrap();
        let globals = extract_globals(&tree, source);
        assert_eq!(globals.len(), 2);
        assert_eq!(globals[0].name, "$base_url");
        assert_eq!(
            globals[0].summary.as_deref(),
            Some("The base URL of the site.")
        );
        assert_eq!(globals[1].name, "$config_directories");
        assert_eq!(globals[1].summary, None);
    }

    #[test]
    fn test_globals_inside_functions_ignored() {
        let source = "<?php\nfunction foo() {\n  global $user;\n}\n";
        let tree = parse_php(source).unwrap();
        assert!(extract_globals(&tree, source).is_empty());
    }
}
