//! Market data collaborators behind one seam
//!
//! The pipeline only sees `MarketDataSource`. `LiveSource` backs it with
//! the exchange sites, the archive cache and a retry policy; tests back it
//! with in-memory fixtures.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::archive::extract_csv;
use super::cache::ArchiveCache;
use super::retry::RetryPolicy;
use super::table::TradeTable;
use super::taifex::TaifexClient;
use super::twse::{IndexLevel, TwseClient};
use crate::core::{TxoError, TxoResult};

pub trait MarketDataSource {
    /// Most recent trading dates, in the order the exchange lists them
    fn trading_days(&self) -> TxoResult<Vec<NaiveDate>>;

    /// The day's trade table
    fn daily_trades(&self, date: NaiveDate) -> TxoResult<TradeTable>;

    /// Official settlement index value for a settlement date
    fn settlement_price(&self, date: NaiveDate) -> TxoResult<i64>;

    /// Index open/close per date. Sources without index data return an empty map.
    fn index_levels(&self, _dates: &[NaiveDate]) -> TxoResult<HashMap<NaiveDate, IndexLevel>> {
        Ok(HashMap::new())
    }
}

/// Exchange-backed source
pub struct LiveSource {
    taifex: TaifexClient,
    twse: Option<TwseClient>,
    cache: ArchiveCache,
    retry: RetryPolicy,
}

impl LiveSource {
    pub fn new(
        taifex: TaifexClient,
        twse: Option<TwseClient>,
        cache: ArchiveCache,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            taifex,
            twse,
            cache,
            retry,
        }
    }

    fn archive_bytes(&self, date: NaiveDate) -> TxoResult<Vec<u8>> {
        if let Some(bytes) = self.cache.load(date)? {
            return Ok(bytes);
        }
        let bytes = self
            .retry
            .run(&format!("download archive {}", date), |_| self.taifex.daily_archive(date))?;
        self.cache.save(date, &bytes)?;
        Ok(bytes)
    }
}

impl MarketDataSource for LiveSource {
    fn trading_days(&self) -> TxoResult<Vec<NaiveDate>> {
        let dates = self
            .retry
            .run("fetch trading calendar", |_| self.taifex.trading_days())?;
        tracing::info!("Trading calendar lists {} dates", dates.len());
        Ok(dates)
    }

    fn daily_trades(&self, date: NaiveDate) -> TxoResult<TradeTable> {
        let bytes = self.archive_bytes(date)?;
        let csv = match extract_csv(&bytes) {
            Ok(csv) => csv,
            Err(e) => {
                // A truncated download must not poison the next run
                self.cache.evict(date)?;
                return Err(e);
            }
        };
        let table = TradeTable::from_bytes(&csv)?;
        tracing::info!(
            "{}: {} trades loaded, {} rows skipped",
            date,
            table.stats().loaded,
            table.stats().skipped
        );
        Ok(table)
    }

    fn settlement_price(&self, date: NaiveDate) -> TxoResult<i64> {
        self.retry
            .run(&format!("fetch settlement price {}", date), |_| {
                self.taifex.settlement_price(date)
            })
    }

    fn index_levels(&self, dates: &[NaiveDate]) -> TxoResult<HashMap<NaiveDate, IndexLevel>> {
        let Some(twse) = &self.twse else {
            return Ok(HashMap::new());
        };

        let mut months: Vec<(i32, u32)> = dates.iter().map(|d| (d.year(), d.month())).collect();
        months.sort_unstable();
        months.dedup();

        let mut levels = HashMap::new();
        for (year, month) in months {
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| TxoError::invalid_input(format!("Bad month {}-{}", year, month)))?;
            let month_levels = self
                .retry
                .run(&format!("fetch index levels {}", first.format("%Y/%m")), |_| {
                    twse.month_levels(first)
                })?;
            levels.extend(month_levels);
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::archive::tests::make_zip;
    use crate::data::cache::CacheConfig;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Nothing listens here; any network call fails fast
    const DEAD_URL: &str = "http://127.0.0.1:9";

    fn offline_source(dir: &std::path::Path) -> LiveSource {
        let taifex = TaifexClient::new(DEAD_URL, Duration::from_secs(1)).unwrap();
        let cache = ArchiveCache::new(CacheConfig {
            cache_dir: dir.to_path_buf(),
            enabled: true,
        })
        .unwrap();
        LiveSource::new(taifex, None, cache, RetryPolicy::no_retry())
    }

    #[test]
    fn test_cached_archive_is_used() {
        let dir = tempdir().unwrap();
        let source = offline_source(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();

        let csv = "成交日期,商品代號,履約價格,到期月份(週別),買賣權別,成交時間,成交價格\n\
                   20240710,TXO,17650,202407W2,C,090000,40\n";
        let zip = make_zip(&[("OptionsDaily_2024_07_10.csv", csv.as_bytes())]);
        source.cache.save(date, &zip).unwrap();

        let table = source.daily_trades(date).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.trades()[0].contract, "202407W2");
    }

    #[test]
    fn test_corrupt_cached_archive_is_evicted() {
        let dir = tempdir().unwrap();
        let source = offline_source(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        source.cache.save(date, b"<html>not a zip</html>").unwrap();

        assert!(source.daily_trades(date).is_err());
        assert!(!source.cache.contains(date));
    }

    #[test]
    fn test_index_levels_disabled_without_client() {
        let dir = tempdir().unwrap();
        let source = offline_source(dir.path());
        let date = NaiveDate::from_ymd_opt(2024, 7, 10).unwrap();
        assert!(source.index_levels(&[date]).unwrap().is_empty());
    }

    #[test]
    fn test_unreachable_calendar_exhausts_retries() {
        let dir = tempdir().unwrap();
        let mut source = offline_source(dir.path());
        source.retry = RetryPolicy::new(2, 0, 0, false);

        match source.trading_days() {
            Err(TxoError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected exhausted retries, got {:?}", other),
        }
    }
}
