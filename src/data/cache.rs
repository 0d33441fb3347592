//! Local archive caching
//!
//! Keeps downloaded daily archives on disk so a re-run does not fetch
//! the same day twice.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::archive::archive_file_name;
use crate::core::TxoResult;

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding `OptionsDaily_*.zip`
    pub cache_dir: PathBuf,
    /// Whether to read and write the cache
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./Options"),
            enabled: true,
        }
    }
}

/// Daily archive cache
#[derive(Debug, Clone)]
pub struct ArchiveCache {
    config: CacheConfig,
}

impl ArchiveCache {
    pub fn new(config: CacheConfig) -> TxoResult<Self> {
        if config.enabled && !config.cache_dir.exists() {
            fs::create_dir_all(&config.cache_dir)?;
        }
        Ok(Self { config })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.config.cache_dir.join(archive_file_name(date))
    }

    pub fn dir(&self) -> &Path {
        &self.config.cache_dir
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.config.enabled && self.path_for(date).is_file()
    }

    pub fn load(&self, date: NaiveDate) -> TxoResult<Option<Vec<u8>>> {
        if !self.contains(date) {
            return Ok(None);
        }
        let path = self.path_for(date);
        let bytes = fs::read(&path)?;
        tracing::info!("Loaded archive for {} from cache", date);
        Ok(Some(bytes))
    }

    pub fn save(&self, date: NaiveDate, bytes: &[u8]) -> TxoResult<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let path = self.path_for(date);
        fs::write(&path, bytes)?;
        tracing::info!("Cached archive for {} at {:?}", date, path);
        Ok(())
    }

    /// Drop a cached archive (e.g. after it failed to extract)
    pub fn evict(&self, date: NaiveDate) -> TxoResult<()> {
        let path = self.path_for(date);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
