use anyhow::Context;
use cgt_ledger::config::{Config, OutputFormat};
use cgt_ledger::domain::{sort_trades_chronological, TickerAliases};
use cgt_ledger::{build_report, dedupe_trades, report, store, AppError};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let trades = store::load_trades(&config.trades_path)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to load trades from {}", config.trades_path))?;
    let mut trades = dedupe_trades(trades);
    sort_trades_chronological(&mut trades);

    let aliases = match &config.aliases_path {
        Some(path) => store::load_aliases(path)
            .map_err(AppError::from)
            .with_context(|| format!("Failed to load ticker aliases from {}", path))?,
        None => TickerAliases::new(),
    };

    tracing::info!(
        trades = trades.len(),
        aliased_symbols = aliases.len(),
        tax_year = ?config.tax_year.map(|y| y.label()),
        "loaded ledger"
    );

    let ledger = build_report(&trades, &aliases, &config.match_options(), config.tax_year)
        .map_err(AppError::from)?;
    for warning in &ledger.warnings {
        tracing::warn!(?warning, "data quality warning");
    }

    let stdout = std::io::stdout();
    match config.output_format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(stdout.lock(), &ledger)
                .context("Failed to write JSON report")?;
            println!();
        }
        OutputFormat::Csv => {
            report::write_csv(&ledger.disposals, stdout.lock()).map_err(AppError::from)?;
        }
    }
    Ok(())
}
