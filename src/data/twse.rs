//! TAIEX open/close levels from the Taiwan Stock Exchange
//!
//! The monthly history endpoint returns one row per trading day with
//! ROC-calendar dates and comma-grouped prices:
//! `["113/07/01", "23,042.70", "23,187.88", "23,015.17", "23,058.57"]`

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::{Session, TxoError, TxoResult};

pub const DEFAULT_BASE_URL: &str = "https://www.twse.com.tw";

/// ROC year 1 is 1912
const ROC_YEAR_OFFSET: i32 = 1911;

/// Index open and close for one trading day, whole points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLevel {
    pub open: i64,
    pub close: i64,
}

impl IndexLevel {
    pub fn for_session(&self, session: Session) -> i64 {
        match session {
            Session::Open => self.open,
            Session::Close => self.close,
        }
    }
}

/// TWSE HTTP client
pub struct TwseClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TwseClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TxoResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Daily open/close for the month containing `date`
    pub fn month_levels(&self, date: NaiveDate) -> TxoResult<HashMap<NaiveDate, IndexLevel>> {
        let first = date.with_day(1).unwrap_or(date);
        let url = format!(
            "{}/rwd/zh/TAIEX/MI_5MINS_HIST?date={}&response=json",
            self.base_url,
            first.format("%Y%m%d")
        );
        tracing::info!("Fetching index levels for {}", first.format("%Y/%m"));

        let response: TwseMonthResponse = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json()
            .map_err(|e| TxoError::data(format!("Failed to parse index history: {}", e)))?;

        parse_month(&response)
    }
}

#[derive(Debug, Deserialize)]
pub struct TwseMonthResponse {
    #[serde(default)]
    data: Vec<Vec<String>>,
}

pub fn parse_month(response: &TwseMonthResponse) -> TxoResult<HashMap<NaiveDate, IndexLevel>> {
    let mut levels = HashMap::new();
    for row in &response.data {
        if row.len() < 5 {
            return Err(TxoError::data(format!("Short index history row: {:?}", row)));
        }
        let date = parse_roc_date(&row[0])?;
        levels.insert(
            date,
            IndexLevel {
                open: parse_points(&row[1])?,
                close: parse_points(&row[4])?,
            },
        );
    }
    Ok(levels)
}

/// `113/07/01` -> 2024-07-01
pub fn parse_roc_date(cell: &str) -> TxoResult<NaiveDate> {
    let bad = || TxoError::data(format!("Not an ROC date: {:?}", cell));
    let mut parts = cell.trim().split('/');
    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
    let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
    let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
    NaiveDate::from_ymd_opt(year + ROC_YEAR_OFFSET, month, day).ok_or_else(bad)
}

/// `23,042.70` -> 23042 (fraction truncated)
pub fn parse_points(cell: &str) -> TxoResult<i64> {
    let cleaned = cell.trim().replace(',', "");
    let whole = cleaned.split('.').next().unwrap_or_default();
    whole
        .parse()
        .map_err(|_| TxoError::data(format!("Not an index level: {:?}", cell)))
}
