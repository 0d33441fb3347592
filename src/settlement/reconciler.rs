//! Settlement reconciliation
//!
//! Once a contract settles, every ledger row matched against it gets the
//! intrinsic value of both legs at the official settlement price, and the
//! row dated on the settlement day is marked as the end of the period.

use chrono::NaiveDate;

use crate::core::{OptionRight, TxoResult};
use crate::ledger::{Ledger, LedgerRow};

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub rows: usize,
    /// Rows with at least one leg left empty for lack of a strike
    pub incomplete: usize,
    pub period_end_marked: bool,
}

/// Fill intrinsic values for a run of rows belonging to one contract.
///
/// Rows are visited from the most recent back to the first of the run.
/// A leg whose strike is missing is left empty. Re-running with the same
/// inputs rewrites the same values.
pub fn reconcile(rows: &mut [LedgerRow], settlement_price: i64, settlement_date: NaiveDate) -> ReconcileReport {
    let mut report = ReconcileReport {
        rows: rows.len(),
        incomplete: 0,
        period_end_marked: false,
    };

    for row in rows.iter_mut().rev() {
        row.intrinsic_call = row
            .call_strike
            .map(|k| OptionRight::Call.intrinsic(settlement_price, k));
        row.intrinsic_put = row
            .put_strike
            .map(|k| OptionRight::Put.intrinsic(settlement_price, k));

        if row.intrinsic_call.is_none() || row.intrinsic_put.is_none() {
            report.incomplete += 1;
        }
    }

    // Terminal row: the last one dated on the settlement day
    if let Some(last) = rows.iter_mut().rev().find(|r| r.date == Some(settlement_date)) {
        last.period_end = true;
        report.period_end_marked = true;
    }

    report
}

/// Reconcile the ledger's most recent run of `contract`
pub fn reconcile_period(
    ledger: &mut Ledger,
    contract: &str,
    settlement_price: i64,
    settlement_date: NaiveDate,
) -> TxoResult<ReconcileReport> {
    let Some(run) = ledger.period_run(contract) else {
        tracing::warn!("No ledger rows for settled contract {}", contract);
        return Ok(ReconcileReport {
            rows: 0,
            incomplete: 0,
            period_end_marked: false,
        });
    };

    let report = reconcile(ledger.rows_mut(run.clone()), settlement_price, settlement_date);
    tracing::info!(
        "Settled {} at {}: {} rows (ledger {}..{}), {} incomplete",
        contract,
        settlement_price,
        report.rows,
        run.start,
        run.end,
        report.incomplete
    );
    Ok(report)
}
