pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod report;
pub mod store;

pub use config::Config;
pub use domain::{
    dedupe_trades, AliasResolver, Currency, Decimal, Side, Symbol, TaxYear, TickerAliases,
    TickerRename, TimeMs, Trade, TradeError, TradeFields, TradeRecord,
};
pub use engine::{
    match_gains, open_positions, BuyMatch, DataWarning, Disposal, DisposalTotals, HoldingMatcher,
    MatchError, MatchOptions, MatchReport, MatchRule, Position, Section104Pool,
};
pub use error::AppError;
pub use report::{build_report, LedgerReport};
