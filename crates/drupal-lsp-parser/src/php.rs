//! PhpParser: tree-sitter-php wrapper plus CST helpers shared by the extractors.

use crate::error::ParseError;
use tree_sitter::{Node, Parser, Tree};

/// Parses whole PHP files. One instance can be reused for many files.
pub struct PhpParser {
    parser: Parser,
}

impl PhpParser {
    /// Create a parser configured with the tree-sitter PHP language.
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_php::LANGUAGE_PHP.into())?;
        Ok(PhpParser { parser })
    }

    /// Full parse of a source string. Syntax errors still yield a tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParseError> {
        self.parser
            .parse(source.as_bytes(), None)
            .ok_or(ParseError::NoTree)
    }
}

/// Parse a PHP source string with a fresh parser.
pub fn parse_php(source: &str) -> Result<Tree, ParseError> {
    PhpParser::new()?.parse(source)
}

/// Source text covered by a node.
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

/// The `/** ... */` comment immediately preceding a declaration, if any.
pub fn doc_comment_before<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    let prev = node.prev_sibling()?;
    if prev.kind() != "comment" {
        return None;
    }
    let text = node_text(prev, source);
    text.starts_with("/**").then_some(text)
}
