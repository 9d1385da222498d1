//! Per-file completion cache backing every file-driven provider.
//!
//! A `FileCache` maps each file matched by its pattern to the items
//! extracted from it, and keeps the concatenation of all entries ready for
//! queries. Files are parsed outside the lock; each write replaces whole
//! entries in a single assignment.

use crate::pattern::FilePattern;
use crate::workspace::DrupalWorkspace;
use drupal_lsp_parser::ParseError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns one file's content into cached items.
pub type Extractor<T> = dyn Fn(&Path, &str) -> Result<Vec<T>, ParseError> + Send + Sync;

/// A file-system change reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    Created,
    Changed,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Uninitialized,
    Populating,
    Ready,
}

struct Snapshot<T> {
    /// Entries in first-insertion order.
    entries: Vec<(PathBuf, Arc<Vec<T>>)>,
    flattened: Arc<Vec<T>>,
}

impl<T: Clone> Snapshot<T> {
    fn new(entries: Vec<(PathBuf, Arc<Vec<T>>)>) -> Self {
        let flattened = entries
            .iter()
            .flat_map(|(_, items)| items.iter().cloned())
            .collect();
        Snapshot {
            entries,
            flattened: Arc::new(flattened),
        }
    }
}

struct State<T> {
    snapshot: Snapshot<T>,
    populated: bool,
    in_flight: usize,
}

/// Marks one populate or refresh in flight until dropped.
struct InFlight<'a, T> {
    state: &'a RwLock<State<T>>,
}

impl<'a, T> InFlight<'a, T> {
    fn begin(state: &'a RwLock<State<T>>) -> Self {
        state.write().in_flight += 1;
        InFlight { state }
    }
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.state.write().in_flight -= 1;
    }
}

pub struct FileCache<T> {
    pattern: FilePattern,
    extract: Box<Extractor<T>>,
    state: RwLock<State<T>>,
}

impl<T: Clone + Send + Sync> FileCache<T> {
    pub fn new<F>(pattern: FilePattern, extract: F) -> Self
    where
        F: Fn(&Path, &str) -> Result<Vec<T>, ParseError> + Send + Sync + 'static,
    {
        FileCache {
            pattern,
            extract: Box::new(extract),
            state: RwLock::new(State {
                snapshot: Snapshot::new(Vec::new()),
                populated: false,
                in_flight: 0,
            }),
        }
    }

    pub fn pattern(&self) -> &FilePattern {
        &self.pattern
    }

    /// Whether a file-system event for `path` concerns this cache.
    pub fn watches(&self, workspace: &DrupalWorkspace, path: &Path) -> bool {
        self.pattern.matches(workspace.root(), path)
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.state.read();
        if state.in_flight > 0 {
            CacheStatus::Populating
        } else if state.populated {
            CacheStatus::Ready
        } else {
            CacheStatus::Uninitialized
        }
    }

    /// Flattened items of every cached file. Never parses.
    pub fn items(&self) -> Arc<Vec<T>> {
        self.state.read().snapshot.flattened.clone()
    }

    /// Items cached for one file.
    pub fn entry(&self, path: &Path) -> Option<Arc<Vec<T>>> {
        self.state
            .read()
            .snapshot
            .entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, items)| items.clone())
    }

    pub fn file_count(&self) -> usize {
        self.state.read().snapshot.entries.len()
    }

    /// Scan the workspace and rebuild every entry.
    pub fn populate(&self, workspace: &DrupalWorkspace) {
        let _in_flight = InFlight::begin(&self.state);
        let files = workspace.find_files(&self.pattern);
        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let items = self.extract_logged(&path, &content);
                    entries.push((path, Arc::new(items)));
                }
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        tracing::debug!(
            "Cached {} files for {}",
            entries.len(),
            self.pattern.as_str()
        );

        let snapshot = Snapshot::new(entries);
        let mut state = self.state.write();
        state.snapshot = snapshot;
        state.populated = true;
    }

    /// Re-read and re-parse one created or changed file.
    ///
    /// An unreadable file keeps its previous entry. A file that reads but
    /// fails to parse gets an empty entry.
    pub fn refresh_file(&self, path: &Path) {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Keeping cached entry for {}: {}", path.display(), e);
                return;
            }
        };
        let _in_flight = InFlight::begin(&self.state);
        let items = Arc::new(self.extract_logged(path, &content));

        let mut state = self.state.write();
        let mut entries = state.snapshot.entries.clone();
        match entries.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = items,
            None => entries.push((path.to_path_buf(), items)),
        }
        state.snapshot = Snapshot::new(entries);
    }

    /// Drop the entry of a deleted file.
    pub fn remove_file(&self, path: &Path) {
        let mut state = self.state.write();
        if !state.snapshot.entries.iter().any(|(p, _)| p == path) {
            return;
        }
        let entries = state
            .snapshot
            .entries
            .iter()
            .filter(|(p, _)| p != path)
            .cloned()
            .collect();
        state.snapshot = Snapshot::new(entries);
    }

    /// Route a file-system event to `refresh_file` or `remove_file`.
    pub fn apply(&self, path: &Path, event: FileEvent) {
        match event {
            FileEvent::Created | FileEvent::Changed => self.refresh_file(path),
            FileEvent::Deleted => self.remove_file(path),
        }
    }

    fn extract_logged(&self, path: &Path, content: &str) -> Vec<T> {
        match (self.extract)(path, content) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }
}

/// Item-type-erased view of a `FileCache`, used to drive every cache of a
/// workspace from one place.
pub trait WatchedCache: Send + Sync {
    fn pattern(&self) -> &FilePattern;
    fn status(&self) -> CacheStatus;
    fn populate(&self, workspace: &DrupalWorkspace);
    fn apply(&self, path: &Path, event: FileEvent);
}

impl<T: Clone + Send + Sync> WatchedCache for FileCache<T> {
    fn pattern(&self) -> &FilePattern {
        FileCache::pattern(self)
    }

    fn status(&self) -> CacheStatus {
        FileCache::status(self)
    }

    fn populate(&self, workspace: &DrupalWorkspace) {
        FileCache::populate(self, workspace)
    }

    fn apply(&self, path: &Path, event: FileEvent) {
        FileCache::apply(self, path, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// One item per non-empty line; a line reading `!` is a parse error.
    fn line_cache() -> FileCache<String> {
        FileCache::new(FilePattern::new("data/*.txt").unwrap(), |_path, content| {
            if content.lines().any(|l| l == "!") {
                return Err(ParseError::NoTree);
            }
            Ok(content
                .lines()
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect())
        })
    }

    fn setup() -> (tempfile::TempDir, DrupalWorkspace) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        let ws = DrupalWorkspace::new(dir.path());
        (dir, ws)
    }

    fn sorted(items: &[String]) -> Vec<String> {
        let mut v = items.to_vec();
        v.sort();
        v
    }

    #[test]
    fn test_populate_flattens_all_files() {
        let (dir, ws) = setup();
        fs::write(dir.path().join("data/a.txt"), "a1\na2\n").unwrap();
        fs::write(dir.path().join("data/b.txt"), "b1\n").unwrap();
        fs::write(dir.path().join("data/c.md"), "ignored\n").unwrap();

        let cache = line_cache();
        assert_eq!(cache.status(), CacheStatus::Uninitialized);
        assert!(cache.items().is_empty());

        cache.populate(&ws);
        assert_eq!(cache.status(), CacheStatus::Ready);
        assert_eq!(cache.file_count(), 2);
        assert_eq!(sorted(&cache.items()), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn test_refresh_replaces_only_that_entry() {
        let (dir, ws) = setup();
        let a = dir.path().join("data/a.txt");
        let b = dir.path().join("data/b.txt");
        fs::write(&a, "a1\n").unwrap();
        fs::write(&b, "b1\n").unwrap();
        let cache = line_cache();
        cache.populate(&ws);
        let before_b = cache.entry(&b).unwrap();

        fs::write(&a, "a9\n").unwrap();
        cache.refresh_file(&a);

        assert_eq!(sorted(&cache.items()), vec!["a9", "b1"]);
        assert!(Arc::ptr_eq(&before_b, &cache.entry(&b).unwrap()));
        assert_eq!(cache.status(), CacheStatus::Ready);
    }

    #[test]
    fn test_refresh_adds_new_file_and_remove_drops_it() {
        let (dir, ws) = setup();
        let cache = line_cache();
        cache.populate(&ws);
        assert!(cache.items().is_empty());

        let c = dir.path().join("data/c.txt");
        fs::write(&c, "c1\nc2\n").unwrap();
        cache.refresh_file(&c);
        assert_eq!(cache.items().len(), 2);

        fs::remove_file(&c).unwrap();
        cache.remove_file(&c);
        assert!(cache.items().is_empty());
        assert_eq!(cache.file_count(), 0);
    }

    #[test]
    fn test_refresh_unchanged_file_is_idempotent() {
        let (dir, ws) = setup();
        let a = dir.path().join("data/a.txt");
        fs::write(&a, "a1\na2\n").unwrap();
        fs::write(dir.path().join("data/b.txt"), "b1\n").unwrap();
        let cache = line_cache();
        cache.populate(&ws);
        let before = sorted(&cache.items());

        cache.refresh_file(&a);
        cache.refresh_file(&a);
        assert_eq!(sorted(&cache.items()), before);
        assert_eq!(cache.file_count(), 2);
    }

    #[test]
    fn test_panicking_extractor_leaves_cache_settled() {
        let (dir, ws) = setup();
        fs::write(dir.path().join("data/a.txt"), "boom\n").unwrap();
        let cache: FileCache<String> =
            FileCache::new(FilePattern::new("data/*.txt").unwrap(), |_path, content| {
                if content.starts_with("boom") {
                    panic!("extractor failure");
                }
                Ok(vec![content.to_string()])
            });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cache.populate(&ws)));
        assert!(result.is_err());
        assert_ne!(cache.status(), CacheStatus::Populating);

        fs::write(dir.path().join("data/a.txt"), "fine").unwrap();
        cache.populate(&ws);
        assert_eq!(cache.status(), CacheStatus::Ready);
        assert_eq!(*cache.items(), vec!["fine".to_string()]);
    }

    #[test]
    fn test_unreadable_file_keeps_entry() {
        let (dir, ws) = setup();
        let a = dir.path().join("data/a.txt");
        fs::write(&a, "a1\n").unwrap();
        let cache = line_cache();
        cache.populate(&ws);

        fs::remove_file(&a).unwrap();
        cache.refresh_file(&a);
        assert_eq!(*cache.items(), vec!["a1".to_string()]);
    }

    #[test]
    fn test_parse_failure_empties_entry() {
        let (dir, ws) = setup();
        let a = dir.path().join("data/a.txt");
        fs::write(&a, "a1\n").unwrap();
        let cache = line_cache();
        cache.populate(&ws);

        fs::write(&a, "a1\n!\n").unwrap();
        cache.refresh_file(&a);
        assert!(cache.items().is_empty());
        assert_eq!(cache.entry(&a).map(|e| e.len()), Some(0));
    }

    #[test]
    fn test_snapshot_is_stable_across_writes() {
        let (dir, ws) = setup();
        let a = dir.path().join("data/a.txt");
        fs::write(&a, "a1\n").unwrap();
        let cache = line_cache();
        cache.populate(&ws);

        let snapshot = cache.items();
        fs::write(&a, "a2\n").unwrap();
        cache.refresh_file(&a);
        assert_eq!(*snapshot, vec!["a1".to_string()]);
        assert_eq!(*cache.items(), vec!["a2".to_string()]);
    }

    #[test]
    fn test_apply_events() {
        let (dir, ws) = setup();
        let cache = line_cache();
        cache.populate(&ws);
        let a = dir.path().join("data/a.txt");
        fs::write(&a, "a1\n").unwrap();

        let watched: &dyn WatchedCache = &cache;
        watched.apply(&a, FileEvent::Created);
        assert_eq!(cache.items().len(), 1);
        watched.apply(&a, FileEvent::Deleted);
        assert!(cache.items().is_empty());
        assert_eq!(watched.status(), CacheStatus::Ready);
    }

    #[test]
    fn test_watches() {
        let (dir, ws) = setup();
        let cache = line_cache();
        assert!(cache.watches(&ws, &dir.path().join("data/x.txt")));
        assert!(!cache.watches(&ws, &dir.path().join("other/x.txt")));
    }
}
