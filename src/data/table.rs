//! Daily trade table loader
//!
//! Parses one day's options trade log (TAIFEX `OptionsDaily_*.csv`) into
//! an in-memory table indexed by trade time.
//!
//! Layout (one trade per row):
//! 成交日期, 商品代號, 履約價格, 到期月份(週別), 買賣權別, 成交時間, 成交價格, 成交數量(B or S), 開盤集合競價
//!
//! Exchange exports pad both headers and cells with spaces, and the
//! header is Big5 encoded. Columns are located by name when the header
//! decodes, otherwise by the fixed exchange order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder, Trim};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{OptionRight, Strike, TradeRecord, TradeTime, TxoError, TxoResult};

/// Column positions of the fields the matcher needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub product: usize,
    pub strike: usize,
    pub contract: usize,
    pub right: usize,
    pub time: usize,
    pub price: usize,
}

impl Default for ColumnMap {
    /// Fixed exchange column order
    fn default() -> Self {
        Self {
            product: 1,
            strike: 2,
            contract: 3,
            right: 4,
            time: 5,
            price: 6,
        }
    }
}

impl ColumnMap {
    /// Locate columns by (trimmed) header name, falling back to the
    /// exchange order when any required name is missing.
    pub fn resolve(headers: &[String]) -> Self {
        let located = (|| {
            Some(Self {
                product: find_column(headers, &["商品代號", "product"])?,
                strike: find_column(headers, &["履約價格", "strike"])?,
                contract: find_column(headers, &["到期月份(週別)", "contract", "expiry"])?,
                right: find_column(headers, &["買賣權別", "right", "cp"])?,
                time: find_column(headers, &["成交時間", "time"])?,
                price: find_column(headers, &["成交價格", "price"])?,
            })
        })();

        match located {
            Some(map) => map,
            None => {
                tracing::debug!("Header names not recognised, using exchange column order");
                Self::default()
            }
        }
    }
}

fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
}

/// Row counts from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    /// Data rows read
    pub rows: usize,
    /// Rows kept in the table
    pub loaded: usize,
    /// Rows dropped for missing or unparseable fields
    pub skipped: usize,
}

/// One trading day's trades, read-only once loaded
#[derive(Debug, Clone, Default)]
pub struct TradeTable {
    columns: Vec<String>,
    trades: Vec<TradeRecord>,
    by_time: HashMap<TradeTime, Vec<usize>>,
    stats: LoadStats,
}

impl TradeTable {
    /// Build a table from already-parsed records
    pub fn from_records(records: Vec<TradeRecord>) -> Self {
        let stats = LoadStats {
            rows: records.len(),
            loaded: records.len(),
            skipped: 0,
        };
        let mut table = Self {
            columns: Vec::new(),
            trades: records,
            by_time: HashMap::new(),
            stats,
        };
        table.build_index();
        table
    }

    /// Load from a CSV file on disk
    pub fn from_path(path: impl AsRef<Path>) -> TxoResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(BufReader::new(file))?;
        tracing::info!(
            "Loaded {} trades from {:?} ({} rows skipped)",
            table.stats.loaded,
            path,
            table.stats.skipped
        );
        Ok(table)
    }

    /// Load from an in-memory CSV payload
    pub fn from_bytes(bytes: &[u8]) -> TxoResult<Self> {
        Self::from_reader(bytes)
    }

    pub fn from_reader<R: Read>(reader: R) -> TxoResult<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        if columns.is_empty() {
            return Err(TxoError::data("Trade file has no header row"));
        }
        let map = ColumnMap::resolve(&columns);

        let mut stats = LoadStats::default();
        let mut trades = Vec::new();
        let mut record = ByteRecord::new();

        while rdr.read_byte_record(&mut record)? {
            stats.rows += 1;
            match parse_row(&record, &map) {
                Some(trade) => trades.push(trade),
                None => stats.skipped += 1,
            }
        }
        stats.loaded = trades.len();

        if stats.skipped > 0 {
            tracing::warn!("Skipped {} malformed trade rows", stats.skipped);
        }

        let mut table = Self {
            columns,
            trades,
            by_time: HashMap::new(),
            stats,
        };
        table.build_index();
        Ok(table)
    }

    fn build_index(&mut self) {
        self.by_time.clear();
        for (i, trade) in self.trades.iter().enumerate() {
            self.by_time.entry(trade.time).or_default().push(i);
        }
    }

    /// Trades stamped exactly at `time`, in file order
    pub fn at(&self, time: TradeTime) -> impl Iterator<Item = &TradeRecord> + '_ {
        self.by_time
            .get(&time)
            .into_iter()
            .flat_map(move |idx| idx.iter().map(move |&i| &self.trades[i]))
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    /// Trimmed header names as read from the file
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

fn parse_row(record: &ByteRecord, map: &ColumnMap) -> Option<TradeRecord> {
    Some(TradeRecord {
        product: field(record, map.product)?.to_string(),
        strike: parse_strike(field(record, map.strike)?)?,
        contract: field(record, map.contract)?.to_string(),
        right: OptionRight::from_code(field(record, map.right)?)?,
        time: TradeTime::parse(field(record, map.time)?)?,
        price: Decimal::from_str(field(record, map.price)?).ok()?,
    })
}

/// Non-empty UTF-8 cell, or None
fn field(record: &ByteRecord, i: usize) -> Option<&str> {
    let raw = std::str::from_utf8(record.get(i)?).ok()?.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// Strikes arrive as `17650` or `17650.0000`; only whole points are valid
fn parse_strike(cell: &str) -> Option<Strike> {
    let value = Decimal::from_str(cell).ok()?;
    if value.fract().is_zero() {
        value.to_i64()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
成交日期 ,商品代號 ,履約價格 ,到期月份(週別) ,買賣權別 ,成交時間 ,成交價格 ,成交數量(B or S) ,開盤集合競價
20240710 ,TXO   ,17650 ,202407W2  ,C ,084500 ,40 ,2 ,*
20240710 ,TXO   ,17650 ,202407W2  ,P ,84500 ,42.5 ,1 ,
20240710 ,TXO   ,17700.0000 ,202407  ,C ,090000 ,35 ,1 ,
20240710 ,TXO   ,17700 ,202407  ,P ,090000 ,- ,1 ,
20240710 ,TEO   ,1500 ,202407  ,X ,090000 ,3 ,1 ,
";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_load_trims_headers_and_cells() {
        let table = TradeTable::from_bytes(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.columns()[1], "商品代號");
        assert_eq!(table.stats().rows, 5);
        assert_eq!(table.stats().loaded, 3);
        assert_eq!(table.stats().skipped, 2);

        let first = &table.trades()[0];
        assert_eq!(first.product, "TXO");
        assert_eq!(first.contract, "202407W2");
        assert_eq!(first.right, OptionRight::Call);
        assert_eq!(first.price, dec("40"));
    }

    #[test]
    fn test_leading_zero_optional_in_time() {
        let table = TradeTable::from_bytes(SAMPLE.as_bytes()).unwrap();
        let t = TradeTime::from_hhmmss(84500).unwrap();
        let at: Vec<_> = table.at(t).collect();
        assert_eq!(at.len(), 2);
        assert_eq!(at[1].price, dec("42.5"));
    }

    #[test]
    fn test_decimal_strike_accepted() {
        let table = TradeTable::from_bytes(SAMPLE.as_bytes()).unwrap();
        let t = TradeTime::from_hhmmss(90000).unwrap();
        let at: Vec<_> = table.at(t).collect();
        assert_eq!(at.len(), 1);
        assert_eq!(at[0].strike, 17700);
    }

    #[test]
    fn test_undecodable_header_falls_back_to_exchange_order() {
        // Big5 bytes for the header row are not valid UTF-8
        let mut bytes = vec![0xA6, 0xA8, 0xA5, 0xE6, b','];
        bytes.extend_from_slice(b"\xB0\xD3,a,b,c,d,e\n");
        bytes.extend_from_slice(b"20240710,TXO,17650,202407W2,P,090001,41,1\n");

        let table = TradeTable::from_bytes(&bytes).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.trades()[0].right, OptionRight::Put);
        assert_eq!(table.trades()[0].time.hhmmss(), 90001);
    }

    #[test]
    fn test_english_headers() {
        let csv = "date,product,strike,contract,right,time,price\n\
                   20240710,TXO,17650,202407W2,C,090000,40\n";
        let table = TradeTable::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.trades()[0].strike, 17650);
    }

    #[test]
    fn test_fractional_strike_rejected() {
        assert_eq!(parse_strike("17650.5"), None);
        assert_eq!(parse_strike("17650.00"), Some(17650));
    }
}
