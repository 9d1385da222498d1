//! composer.json / composer.lock inspection.
//!
//! A folder is a Drupal project when its composer.json requires
//! `drupal/core-recommended`. The installed core version comes from
//! composer.lock.

use crate::error::IndexError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

pub const CORE_RECOMMENDED: &str = "drupal/core-recommended";
const CORE_PACKAGE: &str = "drupal/core";

/// Partial composer.json schema (only what we need).
#[derive(Debug, Deserialize, Default)]
pub struct ComposerManifest {
    #[serde(default)]
    pub require: HashMap<String, serde_json::Value>,
}

impl ComposerManifest {
    pub fn is_drupal(&self) -> bool {
        self.require.contains_key(CORE_RECOMMENDED)
    }
}

#[derive(Debug, Deserialize, Default)]
struct ComposerLock {
    #[serde(default)]
    packages: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Parse composer.json content.
pub fn parse_manifest_str(content: &str) -> Result<ComposerManifest, serde_json::Error> {
    serde_json::from_str(content)
}

/// Read and parse `<dir>/composer.json`.
pub fn read_manifest(dir: &Path) -> Result<ComposerManifest, IndexError> {
    let path = dir.join("composer.json");
    let content = std::fs::read_to_string(&path).map_err(|source| IndexError::Io {
        path: path.clone(),
        source,
    })?;
    parse_manifest_str(&content).map_err(|source| IndexError::Json { path, source })
}

/// Whether `dir` holds a composer.json that requires Drupal core.
///
/// Any failure to read or parse the manifest disqualifies the folder.
pub fn is_drupal_project(dir: &Path) -> bool {
    match read_manifest(dir) {
        Ok(manifest) => manifest.is_drupal(),
        Err(e) => {
            tracing::debug!("{} is not a Drupal project: {}", dir.display(), e);
            false
        }
    }
}

/// Major version of the locked `drupal/core` package in composer.lock content.
pub fn core_major_version_str(content: &str) -> Option<u32> {
    let lock: ComposerLock = serde_json::from_str(content).ok()?;
    lock.packages
        .iter()
        .find(|p| p.name == CORE_PACKAGE)
        .and_then(|p| parse_major(&p.version))
}

/// Read `<dir>/composer.lock` and return the Drupal core major version.
pub fn read_core_major_version(dir: &Path) -> Option<u32> {
    let content = std::fs::read_to_string(dir.join("composer.lock")).ok()?;
    core_major_version_str(&content)
}

fn parse_major(version: &str) -> Option<u32> {
    let version = version.trim_start_matches('v');
    version.split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drupal_manifest() {
        let json = r#"{
            "name": "drupal/recommended-project",
            "require": {
                "composer/installers": "^2.0",
                "drupal/core-recommended": "^10.2"
            }
        }"#;
        assert!(parse_manifest_str(json).unwrap().is_drupal());
    }

    #[test]
    fn test_core_in_require_dev_only_does_not_qualify() {
        let json = r#"{"require-dev": {"drupal/core-recommended": "^10"}}"#;
        assert!(!parse_manifest_str(json).unwrap().is_drupal());
    }

    #[test]
    fn test_manifest_without_require() {
        assert!(!parse_manifest_str("{}").unwrap().is_drupal());
    }

    #[test]
    fn test_require_must_be_object() {
        assert!(parse_manifest_str(r#"{"require": ["drupal/core-recommended"]}"#).is_err());
    }

    #[test]
    fn test_core_version_from_lock() {
        let lock = r#"{
            "packages": [
                {"name": "asm89/stack-cors", "version": "v2.2.0"},
                {"name": "drupal/core", "version": "10.2.5"}
            ]
        }"#;
        assert_eq!(core_major_version_str(lock), Some(10));
    }

    #[test]
    fn test_core_version_missing() {
        assert_eq!(core_major_version_str(r#"{"packages": []}"#), None);
        assert_eq!(core_major_version_str("not json"), None);
        assert_eq!(parse_major("v9.5.11"), Some(9));
    }
}
