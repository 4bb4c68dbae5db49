//! Domain types for the capital-gains ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TimeMs, Symbol, Currency, Side
//! - Trade records with stable identities and a persisted record shape
//! - Ticker rename history and alias resolution
//! - Chronological ordering, dedupe, and UK tax years

pub mod alias;
pub mod decimal;
pub mod ordering;
pub mod primitives;
pub mod tax_year;
pub mod trade;

pub use alias::{AliasResolver, Resolution, TickerAliases, TickerRename};
pub use decimal::Decimal;
pub use ordering::{dedupe_trades, sort_trades_chronological};
pub use primitives::{Currency, InvalidSide, Side, Symbol, TimeMs, DAY_MS};
pub use tax_year::TaxYear;
pub use trade::{Trade, TradeError, TradeFields, TradeRecord};
