//! Two-level document cache: an in-process map in front of one file per key.
//!
//! Writes go to memory first and then to disk, so the memory copy is never
//! older than the file. Disk failures are logged and the cache keeps working
//! from memory for the rest of the run.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::api::SyncError;

pub struct LayeredCache {
    root: PathBuf,
    memory: RwLock<HashMap<String, String>>,
    durable_writes: AtomicU64,
}

impl LayeredCache {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache directory: {}", root.display()))?;
        Ok(Self {
            root,
            memory: RwLock::new(HashMap::new()),
            durable_writes: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Durable location of `key`. Empty, `.` and `..` segments are dropped so
    /// a key always resolves inside the root.
    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split(['/', '\\'])
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(body) = self
            .memory
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
        {
            debug!(key = key, "In-memory cache hit");
            return Some(body.clone());
        }

        let path = self.path_for(key);
        if !path.is_file() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(body) => {
                debug!(key = key, bytes = body.len(), "Disk cache hit");
                self.memory
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(key.to_string(), body.clone());
                Some(body)
            }
            Err(e) => {
                warn!(key = key, path = %path.display(), error = %e, "Failed to read cache file");
                None
            }
        }
    }

    pub fn put(&self, key: &str, body: &str) {
        self.memory
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), body.to_string());

        match self.write_durable(key, body) {
            Ok(path) => {
                self.durable_writes.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, path = %path.display(), bytes = body.len(), "Cache saved");
            }
            Err(e) => {
                warn!(key = key, error = %e, "Failed to save cache file, keeping memory copy only");
            }
        }
    }

    /// Write atomically: temp file in the target directory, then rename.
    fn write_durable(&self, key: &str, body: &str) -> Result<PathBuf, SyncError> {
        let path = self.path_for(key);
        if path == self.root {
            return Err(SyncError::CacheIo(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cache key '{}' has no file name", key),
            )));
        }
        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(body.as_bytes())?;
        tmp.persist(&path).map_err(|e| SyncError::CacheIo(e.error))?;
        Ok(path)
    }

    /// Clear memory and recreate an empty durable root.
    pub fn invalidate(&self) {
        self.memory
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();

        if self.root.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                warn!(root = %self.root.display(), error = %e, "Failed to delete cache root");
            }
        }
        if let Err(e) = std::fs::create_dir_all(&self.root) {
            warn!(root = %self.root.display(), error = %e, "Failed to recreate cache root");
        }
    }

    /// Number of successful durable writes since construction
    pub fn durable_writes(&self) -> u64 {
        self.durable_writes.load(Ordering::Relaxed)
    }
}
