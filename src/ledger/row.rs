//! Ledger rows
//!
//! One row per trading date and session. Matcher output fills the
//! strike/premium cells when the day is appended; the intrinsic cells and
//! the period-end marker are filled later, when the contract settles.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{ContractCode, Session, Strike};
use crate::matching::MatchOutcome;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    #[serde(with = "date_cell")]
    pub date: Option<NaiveDate>,
    pub session: Option<Session>,
    pub contract: Option<String>,
    /// Index open (open session) or close (close session), when fetched
    pub index_level: Option<i64>,
    pub call_premium: Option<Decimal>,
    pub call_strike: Option<Strike>,
    pub put_strike: Option<Strike>,
    pub put_premium: Option<Decimal>,
    pub intrinsic_call: Option<i64>,
    pub intrinsic_put: Option<i64>,
    /// Last row of a settled contract period
    #[serde(with = "flag_cell")]
    pub period_end: bool,
}

impl LedgerRow {
    /// Row for one session's match result. NotFound leaves the strike and
    /// premium cells empty.
    pub fn from_outcome(
        date: NaiveDate,
        session: Session,
        contract: ContractCode,
        outcome: &MatchOutcome,
    ) -> Self {
        let mut row = Self {
            date: Some(date),
            session: Some(session),
            contract: Some(contract.to_string()),
            ..Default::default()
        };
        if let Some(x) = outcome.crossing() {
            row.call_premium = Some(x.call_premium);
            row.call_strike = Some(x.call_strike);
            row.put_strike = Some(x.put_strike);
            row.put_premium = Some(x.put_premium);
        }
        row
    }

    pub fn with_index_level(mut self, level: Option<i64>) -> Self {
        self.index_level = level;
        self
    }

    /// Pre-formatted row with no date yet
    pub fn is_blank(&self) -> bool {
        self.date.is_none()
    }

    pub fn is_contract(&self, code: &str) -> bool {
        self.contract.as_deref() == Some(code)
    }

    pub fn has_crossing(&self) -> bool {
        self.call_strike.is_some() && self.put_strike.is_some()
    }
}

/// Dates are written `YYYY/MM/DD`; ISO dashes are accepted on read
mod date_cell {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y/%m/%d";

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}

/// `*` marks a set flag, blank a clear one
mod flag_cell {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(if *flag { "*" } else { "" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(!raw.trim().is_empty())
    }
}
