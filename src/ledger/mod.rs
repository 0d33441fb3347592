//! Persistent results ledger
//!
//! A CSV file holding one row per trading date and session, oldest first.
//! Rows past the write cursor may be pre-formatted blanks; new days fill
//! them before the table grows.
//!
//! Only one process may hold a ledger open: [`Ledger::open`] takes an
//! exclusive lock on a `<ledger>.lock` sibling, released when the ledger
//! is dropped or the process exits.

mod row;

pub use row::*;

use std::fs::{self, File, OpenOptions, TryLockError};
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::core::{TxoError, TxoResult};

/// Exclusive claim on a ledger file.
///
/// An OS advisory lock held on the open `<ledger>.lock` handle. Closing
/// the handle releases it, including when the process dies, so a lock
/// file left on disk never blocks a later run by itself.
#[derive(Debug)]
struct LedgerLock {
    _file: File,
}

impl LedgerLock {
    fn acquire(ledger: &Path) -> TxoResult<Self> {
        let path = lock_path(ledger);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        match file.try_lock() {
            Ok(()) => Ok(Self { _file: file }),
            Err(TryLockError::WouldBlock) => Err(TxoError::LedgerLocked(ledger.display().to_string())),
            Err(TryLockError::Error(e)) => Err(e.into()),
        }
    }
}

fn lock_path(ledger: &Path) -> PathBuf {
    let mut name = ledger.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// The results table
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    rows: Vec<LedgerRow>,
    cursor: usize,
    _lock: Option<LedgerLock>,
}

impl Ledger {
    /// Lock and load the ledger at `path`. A missing file opens empty.
    pub fn open(path: impl AsRef<Path>) -> TxoResult<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = LedgerLock::acquire(&path)?;

        let rows = if path.exists() {
            read_rows(&path)?
        } else {
            tracing::info!("No ledger at {:?}, starting empty", path);
            Vec::new()
        };

        let mut ledger = Self::from_rows(path, rows);
        ledger._lock = Some(lock);
        tracing::info!(
            "Opened ledger {:?}: {} rows, cursor {}",
            ledger.path,
            ledger.rows.len(),
            ledger.cursor
        );
        Ok(ledger)
    }

    /// Unlocked ledger over existing rows
    pub fn from_rows(path: impl Into<PathBuf>, rows: Vec<LedgerRow>) -> Self {
        let cursor = rows.iter().position(LedgerRow::is_blank).unwrap_or(rows.len());
        Self {
            path: path.into(),
            rows,
            cursor,
            _lock: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    /// Rows written so far
    pub fn filled(&self) -> &[LedgerRow] {
        &self.rows[..self.cursor]
    }

    /// Index of the first unwritten row
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Date of the most recent written row
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.filled().iter().rev().find_map(|r| r.date)
    }

    /// Write one row at the cursor
    pub fn append(&mut self, row: LedgerRow) {
        if self.cursor < self.rows.len() {
            self.rows[self.cursor] = row;
        } else {
            self.rows.push(row);
        }
        self.cursor += 1;
    }

    /// Write a day's open row then close row
    pub fn append_day(&mut self, open: LedgerRow, close: LedgerRow) {
        self.append(open);
        self.append(close);
    }

    /// The contiguous run of written rows for `contract`, ending at its most
    /// recent row.
    pub fn period_run(&self, contract: &str) -> Option<Range<usize>> {
        let filled = self.filled();
        let end = filled.iter().rposition(|r| r.is_contract(contract))? + 1;
        let start = filled[..end]
            .iter()
            .rposition(|r| !r.is_contract(contract))
            .map_or(0, |i| i + 1);
        Some(start..end)
    }

    pub fn rows_mut(&mut self, range: Range<usize>) -> &mut [LedgerRow] {
        &mut self.rows[range]
    }

    /// Write the table back, replacing the file atomically
    pub fn save(&self) -> TxoResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            for row in &self.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::debug!("Saved {} ledger rows to {:?}", self.rows.len(), self.path);
        Ok(())
    }
}

fn read_rows(path: &Path) -> TxoResult<Vec<LedgerRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<LedgerRow>().enumerate() {
        // +2: header line and 1-based numbering
        let row = record.map_err(|e| TxoError::ledger(format!("{:?} line {}: {}", path, i + 2, e)))?;
        rows.push(row);
    }
    Ok(rows)
}
