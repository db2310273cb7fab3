use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::ColumnMap;
use crate::error::OccupancyError;
use crate::loader::{load, Loaded, SourceSet};

/// Identity of one load: canonical paths with their modification times,
/// plus the column mapping used to read them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    files: Vec<(PathBuf, Option<SystemTime>)>,
    columns: ColumnMap,
}

impl CacheKey {
    pub fn for_sources(sources: &SourceSet, columns: &ColumnMap) -> Self {
        let files = sources
            .paths()
            .iter()
            .map(|path| {
                let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
                let modified = std::fs::metadata(&canonical)
                    .and_then(|m| m.modified())
                    .ok();
                (canonical, modified)
            })
            .collect();
        Self {
            files,
            columns: columns.clone(),
        }
    }

    fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter().map(|(path, _)| path)
    }

    fn directories(&self) -> BTreeSet<&Path> {
        self.paths().filter_map(|path| path.parent()).collect()
    }

    /// Whether a load for `self` replaces the table cached under `other`:
    /// same column map, and either a shared file or the same directories.
    fn supersedes(&self, other: &CacheKey) -> bool {
        if self.columns != other.columns {
            return false;
        }
        let paths: HashSet<&PathBuf> = self.paths().collect();
        other.paths().any(|path| paths.contains(path)) || self.directories() == other.directories()
    }
}

/// Parsed source tables, shared read-only between requests.
///
/// An entry is replaced as soon as any of its files changes modification
/// time, or a directory gains or loses a file. Cached tables themselves are
/// never mutated.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<CacheKey, Arc<Loaded>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        sources: &SourceSet,
        columns: &ColumnMap,
    ) -> Result<Arc<Loaded>, OccupancyError> {
        let key = CacheKey::for_sources(sources, columns);
        if let Some(hit) = self.entries.get(&key) {
            log::debug!("Table cache hit for {} sources", sources.len());
            return Ok(Arc::clone(hit));
        }

        let stale = self.entries.len();
        self.entries.retain(|k, _| !key.supersedes(k));
        if self.entries.len() < stale {
            log::info!("Source files changed, reloading {} sources", sources.len());
        }

        let loaded = Arc::new(load(sources, columns)?);
        self.entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop every entry a load of `sources` would replace.
    pub fn invalidate(&mut self, sources: &SourceSet, columns: &ColumnMap) {
        let key = CacheKey::for_sources(sources, columns);
        self.entries.retain(|k, _| !key.supersedes(k));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
