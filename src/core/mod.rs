//! Core data types for the crossing pipeline
//!
//! Defines fundamental types:
//! - OptionRight / TradeRecord: one row of the daily trade log
//! - TradeTime / Session: second-resolution trade clock, open/close sessions
//! - ContractCode: weekly/monthly series identifiers and their resolver

pub mod contract;
pub mod error;
pub mod option;
pub mod session;

pub use contract::*;
pub use error::*;
pub use option::*;
pub use session::*;
