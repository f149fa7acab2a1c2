// SheetScript - A sandboxed formula scripting runtime for character sheets
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Script result caches.
//!
//! Results are keyed by provider id, then by the exact script text. There
//! is no eviction: the owner clears a provider (or the whole cache) when
//! the values its scripts read have changed.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written to persisted cache files.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A cache of stringified script results.
pub trait ScriptCache {
    /// Look up the result of `script` for `provider`.
    fn get(&self, provider: &str, script: &str) -> Option<String>;

    /// Store the result of `script` for `provider`.
    fn set(&self, provider: &str, script: &str, value: String);

    /// Remove every entry.
    fn clear(&self);

    /// Remove every entry of one provider.
    fn clear_provider(&self, provider: &str);

    /// Number of cached results across all providers.
    fn len(&self) -> usize;

    /// Check whether the cache holds no results.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// provider id -> script text -> result.
type Entries = BTreeMap<String, BTreeMap<String, String>>;

/// The two-level map both caches are built on.
#[derive(Debug, Default)]
struct ProviderMap {
    entries: RefCell<Entries>,
}

impl ProviderMap {
    fn from_entries(entries: Entries) -> Self {
        Self {
            entries: RefCell::new(entries),
        }
    }

    fn get(&self, provider: &str, script: &str) -> Option<String> {
        self.entries
            .borrow()
            .get(provider)
            .and_then(|scripts| scripts.get(script))
            .cloned()
    }

    fn set(&self, provider: &str, script: &str, value: String) {
        self.entries
            .borrow_mut()
            .entry(provider.to_string())
            .or_default()
            .insert(script.to_string(), value);
    }

    fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn clear_provider(&self, provider: &str) {
        self.entries.borrow_mut().remove(provider);
    }

    fn len(&self) -> usize {
        self.entries.borrow().values().map(BTreeMap::len).sum()
    }
}

/// An in-memory cache owned by a single entity.
#[derive(Debug, Default)]
pub struct EntityCache {
    map: ProviderMap,
}

impl EntityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptCache for EntityCache {
    fn get(&self, provider: &str, script: &str) -> Option<String> {
        self.map.get(provider, script)
    }

    fn set(&self, provider: &str, script: &str, value: String) {
        self.map.set(provider, script, value);
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn clear_provider(&self, provider: &str) {
        self.map.clear_provider(provider);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Errors that can occur while loading or saving the world cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be read or written.
    #[error("Cannot access cache file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file is not valid JSON of the expected shape.
    #[error("Invalid cache data: {0}")]
    Json(#[from] serde_json::Error),

    /// The cache file was written by an incompatible version.
    #[error("Unsupported cache format version {0} (expected {expected})", expected = CACHE_FORMAT_VERSION)]
    Version(u32),
}

/// On-disk layout of the world cache.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    providers: Entries,
}

/// The process-wide cache shared by entities without a cache of their own.
///
/// Unlike [`EntityCache`] it can be persisted as JSON between runs.
#[derive(Debug, Default)]
pub struct WorldCache {
    map: ProviderMap,
}

impl WorldCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a cache from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        let file: CacheFile = serde_json::from_str(json)?;
        if file.version != CACHE_FORMAT_VERSION {
            return Err(CacheError::Version(file.version));
        }
        Ok(Self {
            map: ProviderMap::from_entries(file.providers),
        })
    }

    /// Serialize the cache to JSON.
    pub fn to_json(&self) -> Result<String, CacheError> {
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            providers: self.map.entries.borrow().clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Load a cache file. A missing file yields an empty cache.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        match fs::read_to_string(path) {
            Ok(json) => Self::from_json(&json),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(source) => Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the cache to a file.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ScriptCache for WorldCache {
    fn get(&self, provider: &str, script: &str) -> Option<String> {
        self.map.get(provider, script)
    }

    fn set(&self, provider: &str, script: &str, value: String) {
        self.map.set(provider, script, value);
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn clear_provider(&self, provider: &str) {
        self.map.clear_provider(provider);
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let cache = EntityCache::new();
        assert!(cache.is_empty());
        cache.set("hero", "1 + 1", "2".to_string());
        assert_eq!(cache.get("hero", "1 + 1").as_deref(), Some("2"));
        assert_eq!(cache.get("hero", "1+1"), None);
        assert_eq!(cache.get("villain", "1 + 1"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_provider() {
        let cache = WorldCache::new();
        cache.set("a", "x", "1".to_string());
        cache.set("a", "y", "2".to_string());
        cache.set("b", "x", "3".to_string());
        assert_eq!(cache.len(), 3);
        cache.clear_provider("a");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("b", "x").as_deref(), Some("3"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let cache = WorldCache::new();
        cache.set("hero.str", "$base.value + 2", "12".to_string());
        let restored = WorldCache::from_json(&cache.to_json().unwrap()).unwrap();
        assert_eq!(
            restored.get("hero.str", "$base.value + 2").as_deref(),
            Some("12")
        );
    }

    #[test]
    fn test_rejects_other_versions() {
        let err = WorldCache::from_json(r#"{"version": 99, "providers": {}}"#).unwrap_err();
        assert!(matches!(err, CacheError::Version(99)));
        let err = WorldCache::from_json("not json").unwrap_err();
        assert!(matches!(err, CacheError::Json(_)));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let cache = WorldCache::load(&dir.path().join("missing.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = WorldCache::new();
        cache.set("p", "s", "v".to_string());
        cache.save(&path).unwrap();
        let loaded = WorldCache::load(&path).unwrap();
        assert_eq!(loaded.get("p", "s").as_deref(), Some("v"));
    }
}
