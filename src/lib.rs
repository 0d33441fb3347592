//! # TXO Crossing - Synthetic strike crossings for TAIEX options
//!
//! Batch tooling that reads the exchange's daily options trade log and,
//! at fixed session times, finds the pair of adjacent strikes where call
//! and put premiums cross. By put-call parity that pair brackets the
//! index level the options market is pricing.
//!
//! ## Overview
//!
//! Each trading day produces two observations:
//! - **Open session** (09:00:00): the series settling on the coming Wednesday
//! - **Close session** (13:30:00): the same series, or on a settlement
//!   Wednesday the series that settles a week later
//!
//! Observations are appended to a CSV ledger. When a series settles, its
//! rows are back-filled with the intrinsic value of both legs at the
//! official settlement price.
//!
//! ## Key Components
//!
//! - **Contract codes**: weekly (`YYYYMMW<n>`) and monthly (`YYYYMM`) series from a date
//! - **Trade table**: tolerant loader for the daily trade CSV
//! - **Matcher**: per-second premium book, adjacent-strike crossing rule, widening search
//! - **Settlement**: intrinsic values over a settled contract's ledger rows
//! - **Data sources**: TAIFEX calendar/archives/settlement price, TWSE index levels
//!
//! ## Usage
//!
//! ```rust,no_run
//! use txo_crossing::prelude::*;
//!
//! let table = TradeTable::from_path("OptionsDaily_2024_07_17.csv").unwrap();
//! let date = chrono::NaiveDate::from_ymd_opt(2024, 7, 17).unwrap();
//! let codes = resolve(date);
//!
//! let matcher = CrossingMatcher::new();
//! let target = Session::Open.default_target();
//! match matcher.find(&table, &codes.open.to_string(), target).crossing() {
//!     Some(x) => println!("C {} / P {}", x.call_strike, x.put_strike),
//!     None => println!("no crossing"),
//! }
//! ```
//!
//! ## What This Crate Does NOT Do
//!
//! - Stream or trade in real time
//! - Compute Greeks, implied volatility or fair values
//! - Keep any state outside the ledger file

pub mod config;
pub mod core;
pub mod data;
pub mod ledger;
pub mod matching;
pub mod pipeline;
pub mod settlement;

/// Prelude with commonly used types
pub mod prelude {
    // Core types
    pub use crate::core::{
        is_settlement_day, next_settlement, open_code, resolve, ContractCode, OptionRight,
        Session, SessionCodes, Strike, TradeRecord, TradeTime, TxoError, TxoResult,
    };

    // Data
    pub use crate::data::{
        ArchiveCache, CacheConfig, IndexLevel, LiveSource, LoadStats, MarketDataSource,
        RetryPolicy, TaifexClient, TradeTable, TwseClient,
    };

    // Matching
    pub use crate::matching::{
        find_crossing, BracketKind, CrossingMatcher, MatchOutcome, MatcherConfig, PremiumBook,
        StrikeCrossing,
    };

    // Ledger and settlement
    pub use crate::ledger::{Ledger, LedgerRow};
    pub use crate::settlement::{reconcile, reconcile_period, ReconcileReport};

    // Pipeline
    pub use crate::config::{AppConfig, SessionTargets};
    pub use crate::pipeline::{DayReport, Pipeline, RunReport};
}

// Re-export main types at crate root
pub use crate::core::{TxoError, TxoResult};
pub use crate::matching::{CrossingMatcher, MatchOutcome};
pub use crate::pipeline::Pipeline;
