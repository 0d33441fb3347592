//! Contract-month codes
//!
//! TXO series settle on Wednesdays. The series settling on the third
//! Wednesday of a month is the monthly contract (`YYYYMM`); every other
//! Wednesday settles a weekly contract (`YYYYMMW<n>`).

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::session::Session;

/// Exchange identifier of a weekly or monthly expiry series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractCode {
    Monthly { year: i32, month: u32 },
    Weekly { year: i32, month: u32, week: u32 },
}

impl ContractCode {
    /// Code of the series settling on the given Wednesday
    pub fn for_settlement(wednesday: NaiveDate) -> Self {
        let week = week_of_month(wednesday.day());
        if week == 3 {
            ContractCode::Monthly {
                year: wednesday.year(),
                month: wednesday.month(),
            }
        } else {
            ContractCode::Weekly {
                year: wednesday.year(),
                month: wednesday.month(),
                week,
            }
        }
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, ContractCode::Monthly { .. })
    }
}

impl fmt::Display for ContractCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractCode::Monthly { year, month } => write!(f, "{}{:02}", year, month),
            ContractCode::Weekly { year, month, week } => {
                write!(f, "{}{:02}W{}", year, month, week)
            }
        }
    }
}

/// Contract codes traded in the two sessions of one trading day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCodes {
    pub open: ContractCode,
    pub close: ContractCode,
}

impl SessionCodes {
    /// True only on settlement days, when the close session has rolled
    pub fn rolls(&self) -> bool {
        self.open != self.close
    }

    pub fn for_session(&self, session: Session) -> ContractCode {
        match session {
            Session::Open => self.open,
            Session::Close => self.close,
        }
    }
}

/// Ordinal of a Wednesday within its month.
///
/// Day 7, 14, 21, 28 take the floor, the rest the ceiling, which is
/// `ceil(day / 7)` written without floats.
fn week_of_month(day: u32) -> u32 {
    if day % 7 == 0 {
        day / 7
    } else {
        day / 7 + 1
    }
}

/// First Wednesday on or after `date`
pub fn next_settlement(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday() as i64;
    let wednesday = Weekday::Wed.num_days_from_monday() as i64;
    date + Duration::days((wednesday - from_monday).rem_euclid(7))
}

pub fn is_settlement_day(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Wed
}

/// Open-session contract code for a trading date
pub fn open_code(date: NaiveDate) -> ContractCode {
    ContractCode::for_settlement(next_settlement(date))
}

/// Resolve both session codes for a trading date.
///
/// On a settlement Wednesday the open session still trades the expiring
/// series, but the close session has rolled to the series settling a
/// week later.
pub fn resolve(date: NaiveDate) -> SessionCodes {
    let open = open_code(date);
    let close = if is_settlement_day(date) {
        open_code(date + Duration::days(7))
    } else {
        open
    };
    SessionCodes { open, close }
}
