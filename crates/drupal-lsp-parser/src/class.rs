//! Method doc-block outline of a class, interface or trait file.

use crate::php::{doc_comment_before, node_text};
use crate::phpdoc::doc_summary;
use std::collections::HashMap;
use tree_sitter::{Node, Tree};

/// Method name → doc-comment summary for every class-like declaration in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassOutline {
    methods: HashMap<String, Option<String>>,
}

impl ClassOutline {
    /// Summary of the named method. `None` when the method is unknown or undocumented.
    pub fn method_summary(&self, name: &str) -> Option<&str> {
        self.methods.get(name).and_then(|s| s.as_deref())
    }
}

/// Build the outline of a parsed PHP file.
pub fn extract_class_outline(tree: &Tree, source: &str) -> ClassOutline {
    let mut outline = ClassOutline::default();
    collect_declarations(tree.root_node(), source, &mut outline);
    outline
}

fn collect_declarations(node: Node, source: &str, outline: &mut ClassOutline) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "class_declaration" | "interface_declaration" | "trait_declaration" => {
                if let Some(body) = child.child_by_field_name("body") {
                    collect_methods(body, source, outline);
                }
            }
            // Braced namespaces nest their declarations in a body.
            "namespace_definition" | "compound_statement" => {
                collect_declarations(child, source, outline);
            }
            _ => {}
        }
    }
}

fn collect_methods(body: Node, source: &str, outline: &mut ClassOutline) {
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "method_declaration" {
            continue;
        }
        let Some(name) = member.child_by_field_name("name") else {
            continue;
        };
        let summary = doc_comment_before(member, source).and_then(doc_summary);
        outline
            .methods
            .insert(node_text(name, source).to_string(), summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::php::parse_php;

    #[test]
    fn test_outline_of_namespaced_class() {
        let source = r#"<?php
namespace Drupal\Core\Template;

class TwigExtension {
  /**
   * Generates a URL path given a route name and parameters.
   *
   * @param $name
   */
  public function getPath($name, $parameters = []) {}

  public function getUrl($name) {}
}
"#;
        let tree = parse_php(source).unwrap();
        let outline = extract_class_outline(&tree, source);
        assert_eq!(
            outline.method_summary("getPath"),
            Some("Generates a URL path given a route name and parameters.")
        );
        assert_eq!(outline.method_summary("getUrl"), None);
        assert_eq!(outline.method_summary("missing"), None);
    }

    #[test]
    fn test_outline_of_interface() {
        let source = "<?php\nnamespace Drupal\\Core\\Datetime;\n\ninterface DateFormatterInterface {\n  /**\n   * Formats a date.\n   */\n  public function format($timestamp);\n}\n";
        let tree = parse_php(source).unwrap();
        let outline = extract_class_outline(&tree, source);
        assert_eq!(outline.method_summary("format"), Some("Formats a date."));
    }

    #[test]
    fn test_braced_namespace() {
        let source = "<?php\nnamespace Foo {\n  class Bar {\n    /** Baz it. */\n    public function baz() {}\n  }\n}\n";
        let tree = parse_php(source).unwrap();
        let outline = extract_class_outline(&tree, source);
        assert_eq!(outline.method_summary("baz"), Some("Baz it."));
    }
}
