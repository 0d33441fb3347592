//! CrossingMatcher - temporal widening search over a trade table
//!
//! Starting at the target second, each second is evaluated on its own:
//! build the premium book from the trades stamped at exactly that second
//! for the product and contract, apply the crossing rule, and stop at the
//! first second that yields a bracket. Books are never carried across
//! seconds.

use serde::{Deserialize, Serialize};

use super::book::PremiumBook;
use super::config::MatcherConfig;
use super::crossing::{find_crossing, StrikeCrossing};
use crate::core::TradeTime;
use crate::data::TradeTable;

/// Result of one session search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Found {
        crossing: StrikeCrossing,
        /// Second the crossing was observed at
        at: TradeTime,
        /// Seconds evaluated, including the matching one
        seconds_scanned: u32,
    },
    NotFound {
        contract: String,
        target: TradeTime,
        seconds_scanned: u32,
    },
}

impl MatchOutcome {
    pub fn crossing(&self) -> Option<&StrikeCrossing> {
        match self {
            MatchOutcome::Found { crossing, .. } => Some(crossing),
            MatchOutcome::NotFound { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found { .. })
    }
}

/// Strike-crossing matcher
#[derive(Debug, Clone, Default)]
pub struct CrossingMatcher {
    config: MatcherConfig,
}

impl CrossingMatcher {
    /// Create a matcher with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Premium book for one contract at exactly one second
    pub fn book_at(&self, table: &TradeTable, contract: &str, time: TradeTime) -> PremiumBook {
        PremiumBook::from_trades(
            table
                .at(time)
                .filter(|t| t.is_series(&self.config.product, contract)),
        )
    }

    /// Search for the crossing of `contract` from `target` forward.
    ///
    /// # Arguments
    /// * `table` - The day's trades
    /// * `contract` - Contract-month code, e.g. "202407W2"
    /// * `target` - First second to evaluate
    pub fn find(&self, table: &TradeTable, contract: &str, target: TradeTime) -> MatchOutcome {
        let mut scanned = 0;

        for offset in 0..self.config.horizon_secs {
            let Some(time) = target.plus_seconds(offset as i64) else {
                break;
            };
            scanned += 1;

            let book = self.book_at(table, contract, time);
            if book.is_empty() {
                continue;
            }

            if let Some(crossing) = find_crossing(&book, self.config.tick) {
                tracing::debug!(
                    "{} crossing at {}: C {}@{} / P {}@{}",
                    contract,
                    time,
                    crossing.call_strike,
                    crossing.call_premium,
                    crossing.put_strike,
                    crossing.put_premium
                );
                return MatchOutcome::Found {
                    crossing,
                    at: time,
                    seconds_scanned: scanned,
                };
            }
            tracing::trace!("{} no crossing at {}", contract, time);
        }

        tracing::warn!(
            "{}: no crossing within {}s of {}",
            contract,
            self.config.horizon_secs,
            target
        );
        MatchOutcome::NotFound {
            contract: contract.to_string(),
            target,
            seconds_scanned: scanned,
        }
    }
}
