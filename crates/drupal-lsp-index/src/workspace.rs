//! A Drupal project rooted at one workspace folder.

use crate::composer;
use crate::error::IndexError;
use crate::pattern::FilePattern;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Drupal major version assumed when composer.lock does not tell.
pub const DEFAULT_DRUPAL_VERSION: u32 = 10;

static NEXT_WORKSPACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceId(u64);

impl WorkspaceId {
    fn next() -> Self {
        WorkspaceId(NEXT_WORKSPACE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct DrupalWorkspace {
    id: WorkspaceId,
    root: PathBuf,
    /// `None` until composer.lock has been read.
    version: Mutex<Option<u32>>,
}

impl DrupalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DrupalWorkspace {
            id: WorkspaceId::next(),
            root: root.into(),
            version: Mutex::new(None),
        }
    }

    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` belongs to this workspace.
    pub fn has_file(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// All files under the root matching `pattern`.
    pub fn find_files(&self, pattern: &FilePattern) -> Vec<PathBuf> {
        pattern.find_files(&self.root)
    }

    /// First file under the root matching a glob, e.g. `web/core/globals.api.php`.
    pub fn find_file(&self, pattern: &str) -> Result<Option<PathBuf>, IndexError> {
        let pattern = FilePattern::new(pattern)?;
        Ok(self.find_files(&pattern).into_iter().next())
    }

    /// Installed Drupal core major version, read from composer.lock once.
    pub fn drupal_version(&self) -> u32 {
        let mut cached = self.version.lock();
        if let Some(version) = *cached {
            return version;
        }
        let version =
            composer::read_core_major_version(&self.root).unwrap_or(DEFAULT_DRUPAL_VERSION);
        tracing::debug!("Drupal {} detected in {}", version, self.root.display());
        *cached = Some(version);
        version
    }

    /// Forget the cached version so the next query re-reads composer.lock.
    pub fn invalidate_version(&self) {
        *self.version.lock() = None;
    }

    /// api.drupal.org search page for `symbol` matching this site's core version.
    pub fn api_search_url(&self, symbol: &str) -> String {
        api_search_url(self.drupal_version(), symbol)
    }
}

/// api.drupal.org search page for `symbol` in core major `version`.
pub fn api_search_url(version: u32, symbol: &str) -> String {
    format!("https://api.drupal.org/api/drupal/{}/search/{}", version, symbol)
}

impl PartialEq for DrupalWorkspace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DrupalWorkspace {}
