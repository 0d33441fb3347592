//! Option right and trade record definitions
//!
//! A trade record is one row of the exchange's daily options trade log:
//! product, tick-aligned strike, contract-month code, right, trade time, price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::session::TradeTime;

/// Strike price in index points. Always tick-aligned in the source data.
pub type Strike = i64;

/// Option right (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    /// Parse the exchange's single-letter right code (`C` / `P`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "C" | "c" => Some(OptionRight::Call),
            "P" | "p" => Some(OptionRight::Put),
            _ => None,
        }
    }

    /// Intrinsic value at settlement, clamped at zero
    pub fn intrinsic(&self, settlement: i64, strike: Strike) -> i64 {
        match self {
            OptionRight::Call => (settlement - strike).max(0),
            OptionRight::Put => (strike - settlement).max(0),
        }
    }
}

/// One executed trade from the daily archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Product code (e.g., "TXO")
    pub product: String,
    /// Strike price
    pub strike: Strike,
    /// Contract-month code (e.g., "202407", "202407W2")
    pub contract: String,
    /// Call or Put
    pub right: OptionRight,
    /// Trade time of day
    pub time: TradeTime,
    /// Traded premium
    pub price: Decimal,
}

impl TradeRecord {
    /// Does this trade belong to the given product and contract series?
    pub fn is_series(&self, product: &str, contract: &str) -> bool {
        self.product == product && self.contract == contract
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_codes() {
        assert_eq!(OptionRight::from_code("C"), Some(OptionRight::Call));
        assert_eq!(OptionRight::from_code(" P "), Some(OptionRight::Put));
        assert_eq!(OptionRight::from_code("X"), None);
    }

    #[test]
    fn test_intrinsic_clamps_at_zero() {
        assert_eq!(OptionRight::Call.intrinsic(17600, 17650), 0);
        assert_eq!(OptionRight::Put.intrinsic(17600, 17500), 0);
        assert_eq!(OptionRight::Call.intrinsic(17700, 17650), 50);
        assert_eq!(OptionRight::Put.intrinsic(17600, 17650), 50);
    }
}
