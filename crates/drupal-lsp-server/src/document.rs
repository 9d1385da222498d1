//! Open document text, kept in a rope and edited incrementally.

use drupal_lsp_types::LanguageId;
use ropey::{Rope, RopeSlice};

/// An open text document. Positions are LSP positions: zero-based line and
/// UTF-16 code unit column.
pub struct TextDocument {
    rope: Rope,
    language: LanguageId,
}

impl TextDocument {
    pub fn new(text: &str, language_id: &str) -> Self {
        TextDocument {
            rope: Rope::from_str(text),
            language: LanguageId::from_language_id(language_id),
        }
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    /// Replace the full content.
    pub fn replace(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Apply an incremental edit replacing the range with `new_text`.
    pub fn apply_edit(
        &mut self,
        start_line: u32,
        start_char: u32,
        end_line: u32,
        end_char: u32,
        new_text: &str,
    ) {
        let start = self.position_to_char(start_line, start_char);
        let end = self.position_to_char(end_line, end_char).max(start);
        self.rope.remove(start..end);
        self.rope.insert(start, new_text);
    }

    /// Text of `line` before the cursor at `character`.
    pub fn line_prefix(&self, line: u32, character: u32) -> Option<String> {
        let line = line as usize;
        if line >= self.rope.len_lines() {
            return None;
        }
        let content = line_content(self.rope.line(line));
        let cu = (character as usize).min(content.len_utf16_cu());
        Some(content.slice(..content.utf16_cu_to_char(cu)).to_string())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Char index of a position, clamped to the end of its line (or of the
    /// document for lines past the end).
    fn position_to_char(&self, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(line);
        let content = line_content(self.rope.line(line));
        let cu = (character as usize).min(content.len_utf16_cu());
        line_start + content.utf16_cu_to_char(cu)
    }
}

/// The line without its terminator.
fn line_content(line: RopeSlice<'_>) -> RopeSlice<'_> {
    let mut len = line.len_chars();
    while len > 0 && matches!(line.char(len - 1), '\n' | '\r') {
        len -= 1;
    }
    line.slice(..len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edit_single_line() {
        let mut doc = TextDocument::new("<?php\nclass Foo {}\n", "php");
        doc.apply_edit(1, 6, 1, 9, "Bar");
        assert_eq!(doc.text(), "<?php\nclass Bar {}\n");
        assert_eq!(doc.language(), LanguageId::Php);
    }

    #[test]
    fn test_apply_edit_across_lines_and_insert() {
        let mut doc = TextDocument::new("a\nb\nc\n", "yaml");
        doc.apply_edit(0, 1, 2, 0, "");
        assert_eq!(doc.text(), "ac\n");
        doc.apply_edit(1, 0, 1, 0, "d:\n");
        assert_eq!(doc.text(), "ac\nd:\n");
    }

    #[test]
    fn test_columns_are_utf16_code_units() {
        // 😀 is two UTF-16 code units, ä is one.
        let mut doc = TextDocument::new("$x = '😀ä';\n", "php");
        assert_eq!(doc.line_prefix(0, 8).as_deref(), Some("$x = '😀"));
        doc.apply_edit(0, 8, 0, 9, "o");
        assert_eq!(doc.text(), "$x = '😀o';\n");
    }

    #[test]
    fn test_line_prefix_clamps() {
        let doc = TextDocument::new("first\r\nsecond", "twig");
        assert_eq!(doc.line_prefix(0, 100).as_deref(), Some("first"));
        assert_eq!(doc.line_prefix(1, 3).as_deref(), Some("sec"));
        assert_eq!(doc.line_prefix(5, 0), None);
    }

    #[test]
    fn test_replace() {
        let mut doc = TextDocument::new("old", "javascript");
        doc.replace("new\ntext");
        assert_eq!(doc.line_prefix(1, 4).as_deref(), Some("text"));
        assert_eq!(doc.language(), LanguageId::JavaScript);
    }
}
