//! Module context of a file: its machine name and custom-module root.

use std::path::{Path, PathBuf};

const INFO_SUFFIX: &str = ".info.yml";

/// Machine name of the module or theme containing `path`.
///
/// Walks up from the file's directory to the nearest directory holding a
/// `*.info.yml`, never leaving `root`. The machine name is that file's
/// name without the suffix.
pub fn module_machine_name(path: &Path, root: &Path) -> Option<String> {
    let mut dir = path.parent();
    while let Some(current) = dir {
        if !current.starts_with(root) {
            break;
        }
        if let Some(name) = info_file_stem(current) {
            return Some(name);
        }
        if current == root {
            break;
        }
        dir = current.parent();
    }
    None
}

fn info_file_stem(dir: &Path) -> Option<String> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|n| n.strip_suffix(INFO_SUFFIX))
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
        })
        .collect();
    // read_dir order is unspecified
    names.sort();
    names.into_iter().next()
}

/// `<...>/web/modules/custom/<name>` directory enclosing `path`, if any.
pub fn custom_module_root(path: &Path) -> Option<PathBuf> {
    let components: Vec<_> = path.components().collect();
    components.windows(4).enumerate().find_map(|(i, w)| {
        let is_custom = w[0].as_os_str() == "web"
            && w[1].as_os_str() == "modules"
            && w[2].as_os_str() == "custom"
            && w[3]
                .as_os_str()
                .to_str()
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_alphanumeric() || c == '_'));
        is_custom.then(|| components[..i + 4].iter().collect())
    })
}
