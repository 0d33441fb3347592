//! Daily batch pipeline
//!
//! For every trading date the ledger has not recorded yet, oldest first:
//! load the day's trades, resolve the two session contract codes, run the
//! matcher once per session, append both rows and save. On a settlement
//! Wednesday the settled contract's rows are then reconciled against the
//! official settlement price and saved again.
//!
//! Collaborator failures abort the run; a session without a crossing does
//! not. A run that stopped between saving a settlement day and reconciling
//! it leaves the ledger ending on an unsettled Wednesday; the next run
//! reconciles that period before resuming.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::{AppConfig, SessionTargets};
use crate::core::{contract, Session, SessionCodes, TxoError, TxoResult};
use crate::data::{IndexLevel, MarketDataSource, TradeTable};
use crate::ledger::{Ledger, LedgerRow};
use crate::matching::{CrossingMatcher, MatchOutcome, MatcherConfig};
use crate::settlement::{reconcile_period, ReconcileReport};

/// Both session results for one date
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub open: MatchOutcome,
    pub close: MatchOutcome,
    pub settlement: Option<ReconcileReport>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Settlement left unreconciled by an earlier run and completed by this one
    pub recovered: Option<ReconcileReport>,
    pub days: Vec<DayReport>,
}

impl RunReport {
    /// Sessions recorded without a crossing
    pub fn not_found(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| [&d.open, &d.close])
            .filter(|o| !o.is_found())
            .count()
    }

    pub fn settlements(&self) -> usize {
        self.days.iter().filter(|d| d.settlement.is_some()).count()
    }
}

pub struct Pipeline<S: MarketDataSource> {
    source: S,
    matcher: CrossingMatcher,
    sessions: SessionTargets,
    fetch_index_levels: bool,
}

impl<S: MarketDataSource> Pipeline<S> {
    pub fn new(source: S, matcher: MatcherConfig, sessions: SessionTargets) -> Self {
        Self {
            source,
            matcher: CrossingMatcher::with_config(matcher),
            sessions,
            fetch_index_levels: false,
        }
    }

    pub fn from_config(source: S, config: &AppConfig) -> Self {
        Self::new(source, config.matcher.clone(), config.sessions).with_index_levels(config.fetch_index_levels)
    }

    pub fn with_index_levels(mut self, enabled: bool) -> Self {
        self.fetch_index_levels = enabled;
        self
    }

    /// Trading dates after the ledger's last recorded date, oldest first.
    ///
    /// Fails when the last recorded date has already dropped out of the
    /// calendar window, since the days in between can no longer be fetched.
    pub fn pending_dates(&self, ledger: &Ledger) -> TxoResult<Vec<NaiveDate>> {
        let mut days = self.source.trading_days()?;
        days.sort_unstable();
        days.dedup();

        let Some(last) = ledger.last_date() else {
            tracing::info!("Ledger is empty, processing all {} calendar dates", days.len());
            return Ok(days);
        };

        if !days.contains(&last) {
            return Err(TxoError::invalid_input(format!(
                "Ledger ends on {}, beyond the retrievable horizon starting {}",
                last,
                days.first().map_or_else(|| "-".to_string(), |d| d.to_string())
            )));
        }

        let pending: Vec<NaiveDate> = days.into_iter().filter(|d| *d > last).collect();
        tracing::info!("Resuming after {}: {} dates pending", last, pending.len());
        Ok(pending)
    }

    /// Match both sessions of one day's trades
    pub fn match_day(&self, table: &TradeTable, codes: &SessionCodes) -> (MatchOutcome, MatchOutcome) {
        let [open, close] = Session::ALL.map(|session| {
            let code = codes.for_session(session).to_string();
            self.matcher.find(table, &code, self.sessions.target(session))
        });
        (open, close)
    }

    /// Process one date end to end and persist the ledger
    pub fn process_day(
        &self,
        ledger: &mut Ledger,
        date: NaiveDate,
        level: Option<IndexLevel>,
    ) -> TxoResult<DayReport> {
        let codes = contract::resolve(date);
        let table = self.source.daily_trades(date)?;
        let (open, close) = self.match_day(&table, &codes);

        for (session, outcome) in [(Session::Open, &open), (Session::Close, &close)] {
            match outcome.crossing() {
                Some(x) => tracing::info!(
                    "{} {} {}: C {} @ {} / P {} @ {}",
                    date,
                    session,
                    codes.for_session(session),
                    x.call_strike,
                    x.call_premium,
                    x.put_strike,
                    x.put_premium
                ),
                None => tracing::warn!(
                    "{} {} {}: no crossing, row left empty",
                    date,
                    session,
                    codes.for_session(session)
                ),
            }
        }

        let row = |session: Session, outcome: &MatchOutcome| {
            LedgerRow::from_outcome(date, session, codes.for_session(session), outcome)
                .with_index_level(level.map(|l| l.for_session(session)))
        };
        ledger.append_day(row(Session::Open, &open), row(Session::Close, &close));
        ledger.save()?;

        let settlement = if contract::is_settlement_day(date) {
            Some(self.settle(ledger, date, &codes.open.to_string())?)
        } else {
            None
        };

        Ok(DayReport {
            date,
            open,
            close,
            settlement,
        })
    }

    /// Fetch the settlement price and reconcile the settled contract's rows
    fn settle(&self, ledger: &mut Ledger, date: NaiveDate, settled: &str) -> TxoResult<ReconcileReport> {
        let price = self.source.settlement_price(date)?;
        let report = reconcile_period(ledger, settled, price, date)?;
        ledger.save()?;
        Ok(report)
    }

    /// Finish the settlement of the last recorded day when an earlier run
    /// saved that day's rows but stopped before reconciling them.
    ///
    /// A settled run always carries a period-end row; its absence marks the
    /// settlement as outstanding.
    pub fn settle_outstanding(&self, ledger: &mut Ledger) -> TxoResult<Option<ReconcileReport>> {
        let Some(last) = ledger.last_date() else {
            return Ok(None);
        };
        if !contract::is_settlement_day(last) {
            return Ok(None);
        }

        let settled = contract::resolve(last).open.to_string();
        let Some(run) = ledger.period_run(&settled) else {
            return Ok(None);
        };
        if ledger.rows()[run].iter().any(|r| r.period_end) {
            return Ok(None);
        }

        tracing::warn!("Settlement of {} on {} was never recorded, reconciling now", settled, last);
        self.settle(ledger, last, &settled).map(Some)
    }

    /// Process every pending date
    pub fn run(&self, ledger: &mut Ledger) -> TxoResult<RunReport> {
        let recovered = self.settle_outstanding(ledger)?;

        let dates = self.pending_dates(ledger)?;
        if dates.is_empty() {
            tracing::info!("Ledger is up to date");
            return Ok(RunReport {
                recovered,
                days: Vec::new(),
            });
        }

        let levels: HashMap<NaiveDate, IndexLevel> = if self.fetch_index_levels {
            self.source.index_levels(&dates)?
        } else {
            HashMap::new()
        };

        let mut report = RunReport {
            recovered,
            days: Vec::new(),
        };
        for date in dates {
            tracing::info!("Processing {}", date);
            let day = self.process_day(ledger, date, levels.get(&date).copied())?;
            report.days.push(day);
        }

        tracing::info!(
            "Processed {} dates, {} sessions without a crossing, {} settlements",
            report.days.len(),
            report.not_found(),
            report.settlements()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{OptionRight, TradeRecord, TradeTime};
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeSource {
        days: Vec<NaiveDate>,
        trades: HashMap<NaiveDate, Vec<TradeRecord>>,
        settlements: HashMap<NaiveDate, i64>,
        levels: HashMap<NaiveDate, IndexLevel>,
    }

    impl MarketDataSource for FakeSource {
        fn trading_days(&self) -> TxoResult<Vec<NaiveDate>> {
            Ok(self.days.clone())
        }

        fn daily_trades(&self, date: NaiveDate) -> TxoResult<TradeTable> {
            self.trades
                .get(&date)
                .map(|t| TradeTable::from_records(t.clone()))
                .ok_or_else(|| TxoError::network(format!("no archive for {}", date)))
        }

        fn settlement_price(&self, date: NaiveDate) -> TxoResult<i64> {
            self.settlements.get(&date).copied().ok_or_else(|| TxoError::RetriesExhausted {
                operation: format!("fetch settlement price {}", date),
                attempts: 5,
                last_error: "no row".to_string(),
            })
        }

        fn index_levels(&self, _dates: &[NaiveDate]) -> TxoResult<HashMap<NaiveDate, IndexLevel>> {
            Ok(self.levels.clone())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    /// 17550 cheap, 17600 expensive: crossing C 17600 / P 17550
    fn crossing_trades(contract: &str, hhmmss: u32) -> Vec<TradeRecord> {
        let quote = |strike, right, price| TradeRecord {
            product: "TXO".to_string(),
            strike,
            contract: contract.to_string(),
            right,
            time: TradeTime::from_hhmmss(hhmmss).unwrap(),
            price: Decimal::from(price),
        };
        vec![
            quote(17550, OptionRight::Call, 60),
            quote(17550, OptionRight::Put, 40),
            quote(17600, OptionRight::Call, 35),
            quote(17600, OptionRight::Put, 55),
        ]
    }

    /// Mon 15th to Wed 17th July 2024; the 17th settles the monthly 202407
    fn week_source() -> FakeSource {
        let mut source = FakeSource {
            // Published newest first
            days: vec![day(17), day(16), day(15)],
            ..Default::default()
        };
        // 15th: open only, close session has nothing
        source.trades.insert(day(15), crossing_trades("202407", 90000));
        let mut t16 = crossing_trades("202407", 90003);
        t16.extend(crossing_trades("202407", 133100));
        source.trades.insert(day(16), t16);
        let mut t17 = crossing_trades("202407", 90000);
        t17.extend(crossing_trades("202407W4", 133000));
        source.trades.insert(day(17), t17);
        source.settlements.insert(day(17), 17620);
        source
    }

    fn pipeline(source: FakeSource) -> Pipeline<FakeSource> {
        Pipeline::new(source, MatcherConfig::default(), SessionTargets::default())
    }

    #[test]
    fn test_full_week_with_settlement() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Options.csv");
        let mut ledger = Ledger::open(&path).unwrap();

        let report = pipeline(week_source()).run(&mut ledger).unwrap();
        assert_eq!(report.days.len(), 3);
        assert_eq!(report.not_found(), 1);
        assert_eq!(report.settlements(), 1);

        let rows = ledger.rows();
        assert_eq!(rows.len(), 6);
        let contracts: Vec<_> = rows.iter().map(|r| r.contract.as_deref().unwrap()).collect();
        assert_eq!(contracts, ["202407", "202407", "202407", "202407", "202407", "202407W4"]);

        // NotFound close session on the 15th: written, left empty
        assert_eq!(rows[1].date, Some(day(15)));
        assert_eq!(rows[1].session, Some(Session::Close));
        assert!(rows[1].call_strike.is_none());
        assert!(rows[1].intrinsic_call.is_none());

        // Settled at 17620: C 17600 -> 20, P 17550 -> 0
        for r in &rows[..5] {
            if r.has_crossing() {
                assert_eq!(r.intrinsic_call, Some(20));
                assert_eq!(r.intrinsic_put, Some(0));
            }
        }
        assert!(rows[4].period_end);
        assert_eq!(rows.iter().filter(|r| r.period_end).count(), 1);

        // The rolled close row belongs to the next period
        assert_eq!(rows[5].call_strike, Some(17600));
        assert!(rows[5].intrinsic_call.is_none());
    }

    #[test]
    fn test_ledger_persisted_and_resumed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Options.csv");

        let mut source = week_source();
        source.days = vec![day(16), day(15)];
        {
            let mut ledger = Ledger::open(&path).unwrap();
            pipeline(source).run(&mut ledger).unwrap();
        }

        let mut ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.last_date(), Some(day(16)));

        let p = pipeline(week_source());
        assert_eq!(p.pending_dates(&ledger).unwrap(), vec![day(17)]);
        let report = p.run(&mut ledger).unwrap();
        assert_eq!(report.days.len(), 1);
        assert_eq!(ledger.rows().len(), 6);

        // Second run has nothing to do
        let report = p.run(&mut ledger).unwrap();
        assert!(report.days.is_empty());
    }

    #[test]
    fn test_ledger_beyond_horizon_is_fatal() {
        let rows = vec![LedgerRow {
            date: Some(day(1)),
            session: Some(Session::Open),
            contract: Some("202407W1".to_string()),
            ..Default::default()
        }];
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::from_rows(dir.path().join("Options.csv"), rows);

        let result = pipeline(week_source()).run(&mut ledger);
        assert!(matches!(result, Err(TxoError::InvalidInput(_))));
        assert_eq!(ledger.rows().len(), 1);
    }

    #[test]
    fn test_settlement_failure_aborts_after_saving_day() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Options.csv");
        let mut source = week_source();
        source.settlements.clear();

        {
            let mut ledger = Ledger::open(&path).unwrap();
            let result = pipeline(source).run(&mut ledger);
            assert!(matches!(result, Err(TxoError::RetriesExhausted { .. })));
        }

        // The settlement day's rows were saved before the price lookup failed
        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.rows().len(), 6);
        assert!(ledger.rows().iter().all(|r| r.intrinsic_call.is_none()));
    }

    #[test]
    fn test_failed_settlement_completed_on_next_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Options.csv");
        let mut source = week_source();
        source.settlements.clear();
        {
            let mut ledger = Ledger::open(&path).unwrap();
            assert!(pipeline(source).run(&mut ledger).is_err());
        }

        let mut ledger = Ledger::open(&path).unwrap();
        let report = pipeline(week_source()).run(&mut ledger).unwrap();
        assert!(report.days.is_empty());
        assert_eq!(report.recovered.map(|r| r.rows), Some(5));

        let rows = ledger.rows();
        assert_eq!(rows.len(), 6);
        assert!(rows[4].period_end);
        assert_eq!(rows[0].intrinsic_call, Some(20));
        assert_eq!(rows[0].intrinsic_put, Some(0));
        assert!(rows[5].intrinsic_call.is_none());

        // Saved, and not reconciled a second time
        drop(ledger);
        let mut ledger = Ledger::open(&path).unwrap();
        assert!(ledger.rows()[4].period_end);
        let report = pipeline(week_source()).run(&mut ledger).unwrap();
        assert!(report.recovered.is_none());
    }

    #[test]
    fn test_non_settlement_last_day_needs_no_recovery() {
        let dir = tempdir().unwrap();
        let mut source = week_source();
        source.days = vec![day(16), day(15)];
        let mut ledger = Ledger::from_rows(dir.path().join("Options.csv"), Vec::new());
        let p = pipeline(source);
        p.run(&mut ledger).unwrap();

        assert_eq!(p.settle_outstanding(&mut ledger).unwrap(), None);
    }

    #[test]
    fn test_missing_archive_is_fatal() {
        let dir = tempdir().unwrap();
        let mut source = week_source();
        source.trades.remove(&day(16));
        let mut ledger = Ledger::from_rows(dir.path().join("Options.csv"), Vec::new());

        assert!(pipeline(source).run(&mut ledger).is_err());
        assert_eq!(ledger.rows().len(), 2);
    }

    #[test]
    fn test_index_levels_recorded_when_enabled() {
        let dir = tempdir().unwrap();
        let mut source = week_source();
        source.days = vec![day(15)];
        source.levels.insert(day(15), IndexLevel { open: 17560, close: 17610 });
        let mut ledger = Ledger::from_rows(dir.path().join("Options.csv"), Vec::new());

        pipeline(source).with_index_levels(true).run(&mut ledger).unwrap();
        assert_eq!(ledger.rows()[0].index_level, Some(17560));
        assert_eq!(ledger.rows()[1].index_level, Some(17610));
    }

    #[test]
    fn test_match_day_uses_session_codes() {
        let source = week_source();
        let table = TradeTable::from_records(source.trades[&day(17)].clone());
        let codes = contract::resolve(day(17));
        let (open, close) = pipeline(FakeSource::default()).match_day(&table, &codes);

        assert!(open.is_found());
        assert!(close.is_found());
        assert_eq!(open.crossing().unwrap().put_strike, 17550);
    }
}
