//! TXO strike-crossing CLI
//!
//! Usage:
//!   txo-crossing run
//!   txo-crossing match --csv OptionsDaily_2024_07_17.csv --date 2024-07-17
//!   txo-crossing codes --date 2024-07-17

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use txo_crossing::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "txo-crossing")]
#[command(about = "Synthetic strike crossings for TAIEX options, recorded to a ledger")]
struct Args {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ledger CSV (overrides the configuration)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Daily archive directory (overrides the configuration)
    #[arg(long, global = true)]
    archive_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process every trading date the ledger has not recorded yet
    Run,

    /// Match both sessions of a local trade file
    Match {
        #[arg(long)]
        csv: PathBuf,

        /// Trading date of the file (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },

    /// Print the open/close contract codes for a date
    Codes {
        #[arg(long)]
        date: NaiveDate,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> TxoResult<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(ledger) = args.ledger {
        config.ledger_path = ledger;
    }
    if let Some(dir) = args.archive_dir {
        config.cache.cache_dir = dir;
    }

    match args.command {
        Command::Run => run(&config),
        Command::Match { csv, date } => match_file(&config, &csv, date),
        Command::Codes { date } => {
            print_codes(date);
            Ok(())
        }
    }
}

fn run(config: &AppConfig) -> TxoResult<()> {
    let mut ledger = Ledger::open(&config.ledger_path)?;
    let pipeline = Pipeline::from_config(config.live_source()?, config);
    let report = pipeline.run(&mut ledger)?;

    if let Some(settled) = &report.recovered {
        println!("Completed an unfinished settlement: {} rows reconciled", settled.rows);
    }
    println!("Processed {} trading days", report.days.len());
    for day in &report.days {
        println!(
            "  {}  open {:<24} close {:<24}{}",
            day.date,
            describe(&day.open),
            describe(&day.close),
            if day.settlement.is_some() { "  settled" } else { "" }
        );
    }
    if report.not_found() > 0 {
        println!("{} sessions recorded without a crossing", report.not_found());
    }
    Ok(())
}

fn match_file(config: &AppConfig, csv: &Path, date: NaiveDate) -> TxoResult<()> {
    let table = TradeTable::from_path(csv)?;
    let stats = table.stats();
    println!(
        "{}: {} rows, {} trades loaded, {} skipped",
        csv.display(),
        stats.rows,
        stats.loaded,
        stats.skipped
    );

    let codes = resolve(date);
    let matcher = CrossingMatcher::with_config(config.matcher.clone());

    for session in Session::ALL {
        let code = codes.for_session(session);
        let target = config.sessions.target(session);
        let outcome = matcher.find(&table, &code.to_string(), target);
        println!("{:<5} {:<9} from {}: {}", session, code.to_string(), target, describe(&outcome));
        if let MatchOutcome::Found { at, seconds_scanned, .. } = &outcome {
            println!("      observed at {} after {} s", at, seconds_scanned);
        }
    }
    Ok(())
}

fn print_codes(date: NaiveDate) {
    let codes = resolve(date);
    println!("{}", date);
    let series = if codes.open.is_monthly() { "monthly" } else { "weekly" };
    println!("  settles  {} ({})", next_settlement(date), series);
    println!("  open     {}", codes.open);
    println!("  close    {}", codes.close);
    if codes.rolls() {
        println!("  settlement day: close session trades the next series");
    }
}

fn describe(outcome: &MatchOutcome) -> String {
    match outcome.crossing() {
        Some(x) => format!("C {}@{} P {}@{}", x.call_strike, x.call_premium, x.put_strike, x.put_premium),
        None => "no crossing".to_string(),
    }
}
