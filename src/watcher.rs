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

//! File watching for the CLI's `--watch` mode.
//!
//! Editors save files in different ways (direct write, write-then-rename,
//! backup-then-write), so the watcher observes the parent directory of each
//! file and filters events down to the files it was asked about.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;

/// Changes arriving within this window are collapsed into one.
const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

/// Errors that can occur while watching files.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The platform watcher could not be created or attached.
    #[error("Failed to watch {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A watched path does not exist.
    #[error("Cannot resolve path {}: {source}", .path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event channel closed or reported an error.
    #[error("Watch error: {0}")]
    Channel(String),
}

/// Watches script and sheet files for changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<Result<Event, notify::Error>>,
    paths: Vec<PathBuf>,
}

impl FileWatcher {
    /// Start watching `paths`.
    ///
    /// # Errors
    ///
    /// Fails if a path cannot be resolved or its directory cannot be watched.
    pub fn new(paths: &[PathBuf]) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();

        let mut watcher = notify::recommended_watcher(tx).map_err(|source| WatchError::Watch {
            path: PathBuf::from("."),
            source,
        })?;

        let mut canonical_paths = Vec::new();
        let mut watched_dirs = HashSet::new();

        for path in paths {
            let canonical = path.canonicalize().map_err(|source| WatchError::Resolve {
                path: path.clone(),
                source,
            })?;

            if let Some(parent) = canonical.parent() {
                if watched_dirs.insert(parent.to_path_buf()) {
                    watcher
                        .watch(parent, RecursiveMode::NonRecursive)
                        .map_err(|source| WatchError::Watch {
                            path: parent.to_path_buf(),
                            source,
                        })?;
                }
            }

            canonical_paths.push(canonical);
        }

        tracing::debug!(files = canonical_paths.len(), "watching for changes");

        Ok(Self {
            _watcher: watcher,
            rx,
            paths: canonical_paths,
        })
    }

    /// The canonical paths being watched.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Block until a watched file changes.
    pub fn wait_for_change(&self) -> Result<(), WatchError> {
        loop {
            let event = self
                .rx
                .recv()
                .map_err(|e| WatchError::Channel(format!("channel closed: {}", e)))?
                .map_err(|e| WatchError::Channel(e.to_string()))?;

            if !self.is_relevant(&event) {
                continue;
            }

            std::thread::sleep(DEBOUNCE_DURATION);
            while self.rx.try_recv().is_ok() {}

            tracing::debug!(paths = ?event.paths, "file changed");
            return Ok(());
        }
    }

    /// Check whether an event touches one of the watched files.
    fn is_relevant(&self, event: &Event) -> bool {
        if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
            return false;
        }

        event.paths.iter().any(|event_path| {
            let canonical = event_path
                .canonicalize()
                .unwrap_or_else(|_| event_path.clone());
            self.paths.iter().any(|watched| {
                // Atomic saves may briefly report a path that no longer
                // canonicalizes; fall back to comparing directory and name.
                canonical == *watched
                    || (canonical.file_name() == watched.file_name()
                        && canonical.parent() == watched.parent())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_new() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("formula.js");
        let sheet = temp_dir.path().join("sheet.json");
        File::create(&script).unwrap();
        File::create(&sheet).unwrap();

        let watcher = FileWatcher::new(&[script, sheet]).unwrap();
        assert_eq!(watcher.paths().len(), 2);
    }

    #[test]
    fn test_watcher_nonexistent_file() {
        let result = FileWatcher::new(&[PathBuf::from("/nonexistent/path/formula.js")]);
        assert!(matches!(result, Err(WatchError::Resolve { .. })));
    }

    #[test]
    fn test_file_change_detection() {
        let temp_dir = TempDir::new().unwrap();
        let script = temp_dir.path().join("watch_test.js");
        {
            let mut file = File::create(&script).unwrap();
            writeln!(file, "1 + 1").unwrap();
        }

        let watcher = FileWatcher::new(&[script.clone()]).unwrap();

        let target = script.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .truncate(true)
                .open(&target)
                .unwrap();
            writeln!(file, "2 + 2").unwrap();
        });

        let result = watcher.wait_for_change();
        handle.join().unwrap();
        assert!(result.is_ok(), "Should detect file change");
    }
}
