//! Pick the Drupal projects out of the client's workspace folders.

use crate::composer::is_drupal_project;
use crate::workspace::DrupalWorkspace;
use std::collections::HashSet;
use std::path::PathBuf;

/// One workspace per folder whose composer.json requires Drupal core.
///
/// Input order is kept. Folders resolving to the same canonical path
/// produce a single workspace.
pub fn locate_drupal_workspaces(folders: &[PathBuf]) -> Vec<DrupalWorkspace> {
    let mut seen = HashSet::new();
    let mut workspaces = Vec::new();

    for folder in folders {
        let canonical = folder.canonicalize().unwrap_or_else(|_| folder.clone());
        if !seen.insert(canonical) {
            continue;
        }
        if is_drupal_project(folder) {
            tracing::info!("Drupal workspace found at {}", folder.display());
            workspaces.push(DrupalWorkspace::new(folder.clone()));
        }
    }

    workspaces
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_manifest(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("composer.json"), content).unwrap();
    }

    #[test]
    fn test_only_drupal_folders_qualify() {
        let tmp = tempfile::tempdir().unwrap();
        let drupal = tmp.path().join("site");
        let library = tmp.path().join("lib");
        let broken = tmp.path().join("broken");
        let empty = tmp.path().join("empty");
        write_manifest(&drupal, r#"{"require": {"drupal/core-recommended": "^10"}}"#);
        write_manifest(&library, r#"{"require": {"symfony/console": "^6"}}"#);
        write_manifest(&broken, "{ not json");
        fs::create_dir_all(&empty).unwrap();

        let found = locate_drupal_workspaces(&[library, drupal.clone(), broken, empty]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].root(), drupal.as_path());
    }

    #[test]
    fn test_order_kept_and_duplicates_collapsed() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let manifest = r#"{"require": {"drupal/core-recommended": "^10"}}"#;
        write_manifest(&a, manifest);
        write_manifest(&b, manifest);

        let found = locate_drupal_workspaces(&[b.clone(), a.clone(), b.join("../b")]);
        let roots: Vec<&Path> = found.iter().map(|w| w.root()).collect();
        assert_eq!(roots, vec![b.as_path(), a.as_path()]);
    }
}
