//! Application configuration
//!
//! Everything the pipeline needs to know about its environment: where the
//! ledger and archives live, which exchange endpoints to call, how hard to
//! retry, and how the matcher searches. Loaded from an optional JSON file;
//! missing fields take their defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{Session, TradeTime, TxoResult};
use crate::data::{taifex, twse, ArchiveCache, CacheConfig, LiveSource, RetryPolicy, TaifexClient, TwseClient};
use crate::matching::MatcherConfig;

/// Search start time per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTargets {
    pub open: TradeTime,
    pub close: TradeTime,
}

impl Default for SessionTargets {
    fn default() -> Self {
        Self {
            open: Session::Open.default_target(),
            close: Session::Close.default_target(),
        }
    }
}

impl SessionTargets {
    pub fn target(&self, session: Session) -> TradeTime {
        match session {
            Session::Open => self.open,
            Session::Close => self.close,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Results ledger (CSV)
    /// Default: Options.csv
    pub ledger_path: PathBuf,

    /// Daily archive cache
    pub cache: CacheConfig,

    pub taifex_url: String,
    pub twse_url: String,

    /// Per-request HTTP timeout
    /// Default: 10
    pub timeout_secs: u64,

    /// Applied to every collaborator call
    /// Default: 5 attempts, 3 s apart
    pub retry: RetryPolicy,

    pub matcher: MatcherConfig,
    pub sessions: SessionTargets,

    /// Record the TWSE index open/close next to each row
    pub fetch_index_levels: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("Options.csv"),
            cache: CacheConfig::default(),
            taifex_url: taifex::DEFAULT_BASE_URL.to_string(),
            twse_url: twse::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            retry: RetryPolicy::default(),
            matcher: MatcherConfig::default(),
            sessions: SessionTargets::default(),
            fetch_index_levels: true,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> TxoResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from `path` when given, otherwise defaults
    pub fn load(path: Option<&Path>) -> TxoResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Exchange-backed data source for this configuration
    pub fn live_source(&self) -> TxoResult<LiveSource> {
        let taifex = TaifexClient::new(self.taifex_url.clone(), self.timeout())?;
        let twse = if self.fetch_index_levels {
            Some(TwseClient::new(self.twse_url.clone(), self.timeout())?)
        } else {
            None
        };
        let cache = ArchiveCache::new(self.cache.clone())?;
        Ok(LiveSource::new(taifex, twse, cache, self.retry.clone()))
    }
}
