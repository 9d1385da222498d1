//! Source strings from a custom module's PO catalogs, offered at
//! translation call sites of the same module.

use crate::context::{end_of_last_match, escape_snippet, open_quote_after, CompletionRequest};
use crate::error::ProviderError;
use crate::Provider;
use drupal_lsp_index::module::custom_module_root;
use drupal_lsp_index::{FileCache, FilePattern, WatchedCache};
use drupal_lsp_parser::po::parse_po;
use drupal_lsp_types::{Completion, CompletionKind, LanguageId};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;

pub const TRANSLATION_PATTERN: &str = "web/modules/custom/**/*.po";

const PHP_PREFIXES: &[&str] = &["$this->t(", " t(", "formatPlural(", "TranslatableMarkup("];
const JS_PREFIXES: &[&str] = &["Drupal.t(", "Drupal.formatPlural("];
const YAML_PREFIXES: &[&str] = &["_title: ", "title: "];
const TWIG_PREFIXES: &[&str] = &["{{", "{% trans"];

/// YAML files whose values are translatable titles.
const YAML_FILES: &[&str] = &[
    ".routing.yml",
    ".links.menu.yml",
    ".links.task.yml",
    ".links.action.yml",
];

/// A msgid together with the custom module whose catalog declares it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationEntry {
    pub module_root: PathBuf,
    pub msgid: String,
}

pub struct TranslationProvider {
    cache: FileCache<TranslationEntry>,
    placeholder: Regex,
}

impl TranslationProvider {
    pub fn new() -> Result<Self, ProviderError> {
        let cache = FileCache::new(FilePattern::new(TRANSLATION_PATTERN)?, |path, source| {
            let Some(module_root) = custom_module_root(path) else {
                return Ok(vec![]);
            };
            Ok(parse_po(source)?
                .into_iter()
                .filter(|entry| !entry.msgid.is_empty())
                .map(|entry| TranslationEntry {
                    module_root: module_root.clone(),
                    msgid: entry.msgid,
                })
                .collect())
        });
        Ok(TranslationProvider {
            cache,
            placeholder: Regex::new(r"[@%:]\w+")?,
        })
    }

    /// Distinct placeholders of `msgid` in order of appearance.
    fn placeholders<'a>(&self, msgid: &'a str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        self.placeholder
            .find_iter(msgid)
            .map(|m| m.as_str())
            .filter(|p| seen.insert(*p))
            .collect()
    }

    fn item(&self, msgid: &str, language: LanguageId, quote: char) -> Completion {
        let item = Completion::new(msgid, CompletionKind::Text).with_detail("translation");
        let placeholders = self.placeholders(msgid);
        if placeholders.is_empty() || language == LanguageId::Yaml {
            return item;
        }

        let literal = format!("{quote}{}{quote}", escape_snippet(&escape_quoted(msgid, quote)));
        let args: Vec<String> = placeholders
            .iter()
            .enumerate()
            .map(|(i, name)| match language {
                LanguageId::Php => format!("{quote}{name}{quote} => ${}", i + 1),
                _ => format!("{quote}{name}{quote}: ${}", i + 1),
            })
            .collect();
        let args = args.join(", ");

        let snippet = match language {
            LanguageId::Php => format!("{literal}, [{args}]"),
            LanguageId::Twig => format!("{literal}|t({{{args}}})"),
            _ => format!("{literal}, {{{args}}}"),
        };
        item.with_snippet(snippet)
    }
}

fn prefixes_for(request: &CompletionRequest) -> &'static [&'static str] {
    match request.language {
        LanguageId::Php => PHP_PREFIXES,
        LanguageId::JavaScript => JS_PREFIXES,
        LanguageId::Twig => TWIG_PREFIXES,
        LanguageId::Yaml => {
            let name = request.file_name();
            if YAML_FILES.iter().any(|suffix| name.ends_with(suffix)) {
                YAML_PREFIXES
            } else {
                &[]
            }
        }
        LanguageId::Other => &[],
    }
}

/// Backslash-escape `quote` and backslashes for a string literal.
fn escape_quoted(text: &str, quote: char) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Provider for TranslationProvider {
    fn name(&self) -> &'static str {
        "translation"
    }

    fn complete(&self, request: &CompletionRequest) -> Vec<Completion> {
        let Some(module_root) = custom_module_root(&request.path) else {
            return vec![];
        };
        let prefixes = prefixes_for(request);
        let Some(call_end) = end_of_last_match(&request.line_prefix, prefixes) else {
            return vec![];
        };
        let typed_quote = open_quote_after(&request.line_prefix, call_end);
        let quote = typed_quote.map(|(q, _)| q).unwrap_or('\'');

        let entries = self.cache.items();
        let mut seen = HashSet::new();
        entries
            .iter()
            .filter(|e| e.module_root == module_root)
            .filter(|e| seen.insert(e.msgid.as_str()))
            .map(|e| {
                let mut item = self.item(&e.msgid, request.language, quote);
                if let (Some((quote, column)), Some(_)) = (typed_quote, &item.insert_text) {
                    item.replace_range =
                        Some((request.line, column, request.line, request.character));
                    item.filter_text = Some(format!("{}{}", quote, e.msgid));
                }
                item
            })
            .collect()
    }

    fn cache(&self) -> Option<&dyn WatchedCache> {
        Some(&self.cache)
    }
}
