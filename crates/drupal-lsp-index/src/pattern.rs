//! Workspace-relative glob patterns with `{a,b}` alternatives.

use crate::error::IndexError;
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A glob relative to a workspace root, e.g.
/// `web/{core/modules,modules/custom}/*/*.routing.yml`.
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    alternatives: Vec<Pattern>,
}

impl FilePattern {
    pub fn new(source: &str) -> Result<Self, IndexError> {
        let alternatives = expand_braces(source)
            .into_iter()
            .map(|p| {
                Pattern::new(&p).map_err(|e| IndexError::Pattern {
                    pattern: p.clone(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilePattern {
            source: source.to_string(),
            alternatives,
        })
    }

    /// The pattern as written, braces included.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `path` lies under `root` and matches one of the alternatives.
    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        self.alternatives
            .iter()
            .any(|p| p.matches_path_with(relative, MATCH_OPTIONS))
    }

    /// Files under `root` matching the pattern, without duplicates.
    pub fn find_files(&self, root: &Path) -> Vec<PathBuf> {
        let escaped_root = Pattern::escape(&root.to_string_lossy());
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for alternative in &self.alternatives {
            let full = format!("{}/{}", escaped_root.trim_end_matches('/'), alternative.as_str());
            let paths = match glob::glob_with(&full, MATCH_OPTIONS) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!("Invalid glob pattern '{}': {}", full, e);
                    continue;
                }
            };
            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        if seen.insert(path.clone()) {
                            files.push(path);
                        }
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Skipping unreadable path: {}", e),
                }
            }
        }

        files
    }
}

/// Expand every `{a,b}` group into separate patterns, left to right.
///
/// `web/{core,modules/*}/*.{module,theme}` becomes four patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(start) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(len) = pattern[start..].find('}') else {
        return vec![pattern.to_string()];
    };
    let end = start + len;
    let before = &pattern[..start];
    let after = &pattern[end + 1..];

    pattern[start + 1..end]
        .split(',')
        .flat_map(|option| expand_braces(&format!("{before}{option}{after}")))
        .collect()
}
