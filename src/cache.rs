use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::import::{ImportBackend, ImportError, SourceFileData};

/// Refcounted registry of open source files. An entry exists exactly while
/// some editor panel references its path; the last release unloads it from
/// the backend. All count mutation goes through `acquire`/`release`/
/// `replace`/`teardown` — callers never see the counts themselves.
#[derive(Default)]
pub struct SourceFileCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

struct CacheEntry {
    ref_count: usize,
    parsed: Arc<SourceFileData>,
}

impl SourceFileCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Returns the parsed metadata for `path`, loading it through `backend`
    /// only if no panel holds it yet. A failed load inserts nothing.
    pub fn acquire(
        &mut self,
        backend: &mut dyn ImportBackend,
        path: &Path,
    ) -> Result<Arc<SourceFileData>, ImportError> {
        let key = normalize_path(path);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.ref_count += 1;
            return Ok(Arc::clone(&entry.parsed));
        }
        let parsed = Arc::new(backend.load_file(&key)?);
        self.entries.insert(key, CacheEntry { ref_count: 1, parsed: Arc::clone(&parsed) });
        Ok(parsed)
    }

    /// Drops one reference to `path`. The entry is removed and the backend
    /// notified once the count reaches zero. Unknown paths are a silent
    /// no-op; teardown races from independent panels are expected.
    pub fn release(&mut self, backend: &mut dyn ImportBackend, path: &Path) {
        let key = normalize_path(path);
        let Some(entry) = self.entries.get_mut(&key) else { return };
        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.entries.remove(&key);
            backend.unload_file(&key);
        }
    }

    /// The "user re-picked a file" operation: acquire `next` first, then
    /// release `previous`, so a path that is both old and new never dips to
    /// a zero count in between. Re-picking the same path is a pure no-op,
    /// and a failed acquire leaves the previous reference untouched.
    pub fn replace(
        &mut self,
        backend: &mut dyn ImportBackend,
        previous: Option<&Path>,
        next: &Path,
    ) -> Result<Arc<SourceFileData>, ImportError> {
        let next_key = normalize_path(next);
        if previous.is_some_and(|previous| normalize_path(previous) == next_key) {
            if let Some(entry) = self.entries.get(&next_key) {
                return Ok(Arc::clone(&entry.parsed));
            }
            // Same path both sides but nothing held: a plain acquire, with
            // nothing to release afterwards.
            return self.acquire(backend, &next_key);
        }
        let parsed = self.acquire(backend, &next_key)?;
        if let Some(previous) = previous {
            self.release(backend, previous);
        }
        Ok(parsed)
    }

    /// Editor-shutdown teardown: every surviving entry is force-released
    /// exactly once regardless of its count, and the cache ends empty.
    pub fn teardown(&mut self, backend: &mut dyn ImportBackend) {
        let count = self.entries.len();
        for (path, _) in self.entries.drain() {
            backend.unload_file(&path);
        }
        if count > 0 {
            eprintln!("[cache] teardown released {count} file(s)");
        }
    }

    /// Read-only metadata lookup. Panels hold paths, not parsed data, and
    /// re-fetch through here whenever they need display information.
    pub fn metadata(&self, path: &Path) -> Option<Arc<SourceFileData>> {
        self.entries.get(&normalize_path(path)).map(|entry| Arc::clone(&entry.parsed))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    pub fn ref_count(&self, path: &Path) -> usize {
        self.entries.get(&normalize_path(path)).map(|entry| entry.ref_count).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lexical normalization: absolute-ize against the working directory and
/// collapse `.`/`..` components, so equivalent spellings of one path share
/// one cache entry. Deliberately not `canonicalize`; keys must stay stable
/// for files that are renamed or still being written.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
