//! Configuration for the strike-crossing matcher

use serde::{Deserialize, Serialize};

/// Matcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Product code of the index options to match (TAIEX options: "TXO")
    pub product: String,

    /// Strike ladder spacing in index points.
    /// Adjacent strikes are exactly `tick` apart.
    /// Default: 50
    pub tick: i64,

    /// Seconds scanned from the target time, target included.
    /// Default: 300 (five minutes)
    pub horizon_secs: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            product: "TXO".to_string(),
            tick: 50,
            horizon_secs: 300,
        }
    }
}

impl MatcherConfig {
    /// Only the target second itself, no widening
    pub fn exact() -> Self {
        Self {
            horizon_secs: 1,
            ..Default::default()
        }
    }

    pub fn with_horizon(mut self, horizon_secs: u32) -> Self {
        self.horizon_secs = horizon_secs;
        self
    }
}
