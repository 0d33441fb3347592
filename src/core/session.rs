//! Trading sessions and trade times
//!
//! Exchange logs stamp trades as HHMMSS integers (`84500`, `133000`).
//! `TradeTime` keeps them as a clock time so the matcher can step one
//! real second at a time instead of one integer at a time.

use std::fmt;

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Time of day of a trade, second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeTime(NaiveTime);

impl TradeTime {
    pub fn from_hms(hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, min, sec).map(Self)
    }

    /// From the exchange's HHMMSS integer form
    pub fn from_hhmmss(value: u32) -> Option<Self> {
        Self::from_hms(value / 10_000, (value / 100) % 100, value % 100)
    }

    /// Parse an HHMMSS cell; the leading zero of morning hours is optional
    pub fn parse(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() || cell.len() > 6 || !cell.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        cell.parse::<u32>().ok().and_then(Self::from_hhmmss)
    }

    pub fn hhmmss(&self) -> u32 {
        self.0.hour() * 10_000 + self.0.minute() * 100 + self.0.second()
    }

    /// The time `secs` seconds later, or None past the end of the day
    pub fn plus_seconds(&self, secs: i64) -> Option<Self> {
        let (next, wrapped) = self.0.overflowing_add_signed(Duration::seconds(secs));
        if wrapped != 0 {
            None
        } else {
            Some(Self(next))
        }
    }
}

impl fmt::Display for TradeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.hhmmss())
    }
}

/// The two sessions recorded per trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Open,
    Close,
}

impl Session {
    pub const ALL: [Session; 2] = [Session::Open, Session::Close];

    pub fn label(&self) -> &'static str {
        match self {
            Session::Open => "open",
            Session::Close => "close",
        }
    }

    /// Default target time: market open 09:00:00, settlement window 13:30:00
    pub fn default_target(&self) -> TradeTime {
        match self {
            Session::Open => TradeTime(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)),
            Session::Close => TradeTime(NaiveTime::from_hms_opt(13, 30, 0).unwrap_or(NaiveTime::MIN)),
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hhmmss() {
        let t = TradeTime::parse("84500").unwrap();
        assert_eq!(t, TradeTime::from_hms(8, 45, 0).unwrap());
        assert_eq!(TradeTime::parse(" 133000 ").unwrap().hhmmss(), 133000);
        assert!(TradeTime::parse("136000").is_none());
        assert!(TradeTime::parse("13:30").is_none());
        assert!(TradeTime::parse("").is_none());
    }

    #[test]
    fn test_steps_over_minute_boundary() {
        let t = TradeTime::from_hhmmss(90059).unwrap();
        assert_eq!(t.plus_seconds(1).unwrap().hhmmss(), 90100);
        assert_eq!(t.to_string(), "090059");
    }

    #[test]
    fn test_no_wrap_past_midnight() {
        let t = TradeTime::from_hhmmss(235959).unwrap();
        assert!(t.plus_seconds(1).is_none());
    }

    #[test]
    fn test_session_targets() {
        assert_eq!(Session::Open.default_target().hhmmss(), 90000);
        assert_eq!(Session::Close.default_target().hhmmss(), 133000);
    }
}
