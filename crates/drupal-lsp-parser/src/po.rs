//! gettext PO catalog parser.
//!
//! Supports `msgctxt`, `msgid`, `msgid_plural`, `msgstr` / `msgstr[n]`,
//! multi-line string continuation and the usual C escapes. Comments and
//! obsolete (`#~`) entries are skipped.

use crate::error::ParseError;

/// Highest accepted `msgstr[n]` index.
const MAX_PLURAL_INDEX: usize = 16;

/// One translation unit of a PO file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoEntry {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    pub msgstr: Vec<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Pending {
    context: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Vec<String>,
}

impl Pending {
    fn append(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Context => self.context.get_or_insert_with(String::new),
            Field::Id => self.msgid.get_or_insert_with(String::new),
            Field::IdPlural => self.msgid_plural.get_or_insert_with(String::new),
            Field::Str(index) => {
                if self.msgstr.len() <= index {
                    self.msgstr.resize(index + 1, String::new());
                }
                &mut self.msgstr[index]
            }
        };
        slot.push_str(text);
    }

    fn flush(&mut self, entries: &mut Vec<PoEntry>) {
        let pending = std::mem::take(self);
        if let Some(msgid) = pending.msgid {
            entries.push(PoEntry {
                context: pending.context,
                msgid,
                msgid_plural: pending.msgid_plural,
                msgstr: pending.msgstr,
            });
        }
    }
}

/// Parse a PO catalog into its entries (the header entry with an empty
/// msgid included).
pub fn parse_po(source: &str) -> Result<Vec<PoEntry>, ParseError> {
    let mut entries = Vec::new();
    let mut pending = Pending::default();
    let mut field: Option<Field> = None;

    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            pending.flush(&mut entries);
            field = None;
            continue;
        }

        if line.starts_with('#') {
            if pending.msgid.is_some() {
                pending.flush(&mut entries);
            }
            field = None;
            continue;
        }

        if line.starts_with('"') {
            let Some(current) = field else {
                return Err(po_error(line_no, "string continuation without a keyword"));
            };
            pending.append(current, &unquote(line, line_no)?);
            continue;
        }

        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| po_error(line_no, "expected keyword followed by a string"))?;
        let value = unquote(rest.trim(), line_no)?;

        let next = match keyword {
            "msgctxt" => {
                if pending.msgid.is_some() {
                    pending.flush(&mut entries);
                }
                Field::Context
            }
            "msgid" => {
                if pending.msgid.is_some() {
                    pending.flush(&mut entries);
                }
                Field::Id
            }
            "msgid_plural" => Field::IdPlural,
            "msgstr" => Field::Str(0),
            other => match other
                .strip_prefix("msgstr[")
                .and_then(|s| s.strip_suffix(']'))
            {
                Some(n) => match n.parse::<usize>() {
                    Ok(n) if n <= MAX_PLURAL_INDEX => Field::Str(n),
                    _ => return Err(po_error(line_no, &format!("invalid plural index `{}`", n))),
                },
                None => return Err(po_error(line_no, &format!("unknown keyword `{}`", other))),
            },
        };

        pending.append(next, &value);
        field = Some(next);
    }

    pending.flush(&mut entries);
    Ok(entries)
}

fn po_error(line: usize, message: &str) -> ParseError {
    ParseError::Po {
        line,
        message: message.to_string(),
    }
}

/// Strip the surrounding quotes of a PO string and decode escapes.
fn unquote(text: &str, line_no: usize) -> Result<String, ParseError> {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(|| po_error(line_no, "unterminated string"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(po_error(line_no, "dangling escape")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"# German translation of a module.
msgid ""
msgstr ""
"Project-Id-Version: a\n"
"Plural-Forms: nplurals=2; plural=(n!=1);\n"

#: src/Form/SettingsForm.php:12
msgid "Hello @name"
msgstr "Hallo @name"

msgctxt "Long month name"
msgid "May"
msgstr "Mai"

msgid "1 item"
msgid_plural "@count items"
msgstr[0] "1 Element"
msgstr[1] "@count Elemente"

msgid ""
"Multi "
"line"
msgstr "Mehr"

#~ msgid "Obsolete"
#~ msgstr "Veraltet"
"#;

    #[test]
    fn test_parse_catalog() {
        let entries = parse_po(CATALOG).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.msgid.as_str()).collect();
        assert_eq!(ids, vec!["", "Hello @name", "May", "1 item", "Multi line"]);
        assert!(entries[0].msgstr[0].contains("Plural-Forms"));
        assert_eq!(entries[2].context.as_deref(), Some("Long month name"));
        assert_eq!(entries[3].msgid_plural.as_deref(), Some("@count items"));
        assert_eq!(entries[3].msgstr.len(), 2);
    }

    #[test]
    fn test_entries_without_blank_separator() {
        let entries = parse_po("msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].msgid, "b");
    }

    #[test]
    fn test_escapes() {
        let entries = parse_po("msgid \"Say \\\"hi\\\"\\n\"\nmsgstr \"\"\n").unwrap();
        assert_eq!(entries[0].msgid, "Say \"hi\"\n");
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = parse_po("msgid \"a\"\nmsgstr \"A\"\nbogus line\n").unwrap_err();
        match err {
            ParseError::Po { line, .. } => assert_eq!(line, 3),
            other => panic!("expected Po error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_plural_index_is_rejected() {
        for index in ["18446744073709551615", "99999999999", "17", "x"] {
            let source = format!("msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[{}] \"x\"\n", index);
            match parse_po(&source).unwrap_err() {
                ParseError::Po { line, .. } => assert_eq!(line, 3),
                other => panic!("expected Po error, got {:?}", other),
            }
        }
        let entries = parse_po("msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[16] \"x\"\n").unwrap();
        assert_eq!(entries[0].msgstr.len(), 17);
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let entries = parse_po("\u{feff}msgid \"a\"\nmsgstr \"A\"\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msgid, "a");
    }

    #[test]
    fn test_unterminated_string() {
        assert!(parse_po("msgid \"open\nmsgstr \"\"\n").is_err());
    }
}
