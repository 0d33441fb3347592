//! Daily archive extraction
//!
//! The exchange publishes each day's trades as `OptionsDaily_YYYY_MM_DD.zip`
//! holding a single CSV of the same stem.

use std::io::{Cursor, Read};

use chrono::NaiveDate;
use zip::ZipArchive;

use crate::core::{TxoError, TxoResult};

/// `OptionsDaily_2024_07_10`
pub fn archive_stem(date: NaiveDate) -> String {
    format!("OptionsDaily_{}", date.format("%Y_%m_%d"))
}

/// `OptionsDaily_2024_07_10.zip`
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("{}.zip", archive_stem(date))
}

/// Pull the trade CSV out of a daily archive.
///
/// Takes the first `.csv` entry; the exchange archives carry exactly one.
pub fn extract_csv(zip_bytes: &[u8]) -> TxoResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(zip_bytes))?;
    if archive.len() == 0 {
        return Err(TxoError::data("Daily archive contains no entries"));
    }

    let mut csv_index = None;
    for i in 0..archive.len() {
        if archive.by_index_raw(i)?.name().to_ascii_lowercase().ends_with(".csv") {
            csv_index = Some(i);
            break;
        }
    }
    let index = csv_index.ok_or_else(|| TxoError::data("Daily archive contains no CSV entry"))?;

    let mut entry = archive.by_index(index)?;
    tracing::debug!("Extracting {} ({} bytes)", entry.name(), entry.size());

    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}
