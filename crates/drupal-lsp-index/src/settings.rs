//! `drupal.*` client settings for the external PHP tools.

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    pub enabled: bool,
    /// Absolute, or relative to the workspace root. Empty means
    /// `vendor/bin/<tool>`.
    pub executable_path: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrupalSettings {
    pub phpcs: ToolSettings,
    pub phpcbf: ToolSettings,
    pub phpstan: ToolSettings,
    pub drush: ToolSettings,
}

impl DrupalSettings {
    /// Read settings from `initializationOptions` or a
    /// `workspace/didChangeConfiguration` payload.
    ///
    /// Accepts the settings object itself or one nested under `drupal`.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let value = match value {
            serde_json::Value::Object(mut map) if map.contains_key("drupal") => {
                map.remove("drupal").unwrap_or_default()
            }
            other => other,
        };
        if value.is_null() {
            return Ok(DrupalSettings::default());
        }
        serde_json::from_value(value)
    }

    /// `(tool name, settings)` pairs, in a fixed order.
    pub fn tools(&self) -> [(&'static str, &ToolSettings); 4] {
        [
            ("phpcs", &self.phpcs),
            ("phpcbf", &self.phpcbf),
            ("phpstan", &self.phpstan),
            ("drush", &self.drush),
        ]
    }
}

impl ToolSettings {
    /// Path the tool would be run from in the workspace at `root`.
    pub fn executable_path(&self, root: &Path, tool: &str) -> PathBuf {
        if self.executable_path.is_empty() {
            root.join("vendor").join("bin").join(tool)
        } else {
            root.join(&self.executable_path)
        }
    }

    /// Resolved executable, or an error when nothing exists at that path.
    pub fn executable(&self, root: &Path, tool: &'static str) -> Result<PathBuf, IndexError> {
        let path = self.executable_path(root, tool);
        if path.is_file() {
            Ok(path)
        } else {
            Err(IndexError::MissingExecutable { tool, path })
        }
    }
}
