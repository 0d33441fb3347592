//! Taiwan Futures Exchange data fetcher
//!
//! Three endpoints, each a single attempt (retries live in the caller):
//! - the "previous 30 trading days" download page (trading calendar)
//! - the daily options trade archive (`OptionsDaily_YYYY_MM_DD.zip`)
//! - the index option final settlement price query

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::archive::archive_file_name;
use crate::core::{TxoError, TxoResult};

pub const DEFAULT_BASE_URL: &str = "https://www.taifex.com.tw";

/// TAIFEX HTTP client
pub struct TaifexClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl TaifexClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> TxoResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Trading dates listed on the download page, as published (newest first)
    pub fn trading_days(&self) -> TxoResult<Vec<NaiveDate>> {
        let url = format!("{}/cht/3/optPrevious30DaysSalesData", self.base_url);
        tracing::debug!("GET {}", url);

        let html = self.client.get(&url).send()?.error_for_status()?.text()?;
        let dates = parse_trading_days(&html)?;
        if dates.is_empty() {
            return Err(TxoError::data("Trading calendar page lists no dates"));
        }
        Ok(dates)
    }

    /// Raw bytes of one day's trade archive
    pub fn daily_archive(&self, date: NaiveDate) -> TxoResult<Vec<u8>> {
        let url = format!(
            "{}/file/taifex/Dailydownload/OptionsDailydownloadCSV/{}",
            self.base_url,
            archive_file_name(date)
        );
        tracing::info!("Downloading {}", url);

        let bytes = self.client.get(&url).send()?.error_for_status()?.bytes()?;
        Ok(bytes.to_vec())
    }

    /// Official TXO final settlement price for a settlement date
    pub fn settlement_price(&self, date: NaiveDate) -> TxoResult<i64> {
        let url = format!("{}/cht/5/optIndxFSP", self.base_url);
        let year = date.year().to_string();
        let month = format!("{:02}", date.month());
        let form = [
            ("commodityIds", "2"),
            ("_all", "on"),
            ("start_year", year.as_str()),
            ("start_month", month.as_str()),
            ("end_year", year.as_str()),
            ("end_month", month.as_str()),
            ("button", "送出查詢"),
        ];
        tracing::debug!("POST {} for {}", url, date);

        let html = self
            .client
            .post(&url)
            .form(&form)
            .send()?
            .error_for_status()?
            .text()?;

        parse_settlement_price(&html, date)
    }
}

type Pattern = LazyLock<Result<Regex, regex::Error>>;

static DATA_TABLE: Pattern =
    LazyLock::new(|| Regex::new(r#"(?s)<table[^>]*class="[^"]*\btable_f\b[^"]*"[^>]*>(.*?)</table>"#));
static ROW: Pattern = LazyLock::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>"));
static CELL: Pattern = LazyLock::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>"));
static TAG: Pattern = LazyLock::new(|| Regex::new(r"<[^>]+>"));

fn pattern(re: &'static Pattern) -> TxoResult<&'static Regex> {
    re.as_ref().map_err(|e| TxoError::data(e.to_string()))
}

/// Dates from the second column of the download table, first occurrence
/// order, deduplicated
pub fn parse_trading_days(html: &str) -> TxoResult<Vec<NaiveDate>> {
    let mut dates = Vec::new();
    for row in table_rows(html)? {
        let Some(cell) = row.get(1) else { continue };
        if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y/%m/%d") {
            if !dates.contains(&date) {
                dates.push(date);
            }
        }
    }
    Ok(dates)
}

/// Find the settlement row for `date` and read its price cell.
///
/// Row layout: settlement date, contract month, TXO settlement price, ...
pub fn parse_settlement_price(html: &str, date: NaiveDate) -> TxoResult<i64> {
    let target = date.format("%Y/%m/%d").to_string();

    for row in table_rows(html)? {
        if row.first().map(String::as_str) != Some(target.as_str()) {
            continue;
        }
        let cell = row
            .get(2)
            .ok_or_else(|| TxoError::data(format!("Settlement row for {} has no price", target)))?;
        let price = cell
            .replace(',', "")
            .parse::<i64>()
            .map_err(|_| TxoError::data(format!("Settlement price {:?} is not an integer", cell)))?;
        tracing::info!("{} settlement price is {}", target, price);
        return Ok(price);
    }

    Err(TxoError::data(format!("No settlement price published for {}", target)))
}

/// Text of every `<td>` in every `<tr>` of the `table_f` data tables,
/// tags stripped and trimmed
fn table_rows(html: &str) -> TxoResult<Vec<Vec<String>>> {
    let (table_re, row_re) = (pattern(&DATA_TABLE)?, pattern(&ROW)?);
    let (cell_re, tag_re) = (pattern(&CELL)?, pattern(&TAG)?);

    let mut rows = Vec::new();
    for table in table_re.captures_iter(html) {
        for row in row_re.captures_iter(&table[1]) {
            let cells: Vec<String> = cell_re
                .captures_iter(&row[1])
                .map(|cell| tag_re.replace_all(&cell[1], "").trim().to_string())
                .collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }
    }
    Ok(rows)
}
