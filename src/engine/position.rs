//! Open positions at simple average cost.

use crate::domain::{AliasResolver, Currency, Decimal, Symbol, TickerAliases, TimeMs, Trade};
use serde::Serialize;
use std::collections::BTreeMap;

/// Net holding of one canonical symbol.
///
/// A reorganization SELL leg removes the shares it replaces from `total_bought`
/// instead of counting as a sale, so a split keeps the original cost spread
/// over the post-split quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: Symbol,
    pub currency: Currency,
    pub total_bought: Decimal,
    pub total_sold: Decimal,
    /// Net cash of all buys, in trade currency.
    pub total_cost: Decimal,
}

impl Position {
    /// Sum a position from trades already filtered to one symbol.
    pub fn from_trades<'a>(symbol: Symbol, trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut position = Position {
            symbol,
            currency: Currency::new("USD"),
            total_bought: Decimal::zero(),
            total_sold: Decimal::zero(),
            total_cost: Decimal::zero(),
        };
        let mut first = true;
        for trade in trades {
            if first {
                position.currency = trade.currency().clone();
                first = false;
            }
            if trade.is_buy() {
                position.total_bought += trade.qty();
                position.total_cost += trade.net_cash();
            } else if trade.is_reorganization() {
                position.total_bought -= trade.qty();
            } else {
                position.total_sold += trade.qty();
            }
        }
        position
    }

    pub fn quantity(&self) -> Decimal {
        self.total_bought - self.total_sold
    }

    pub fn avg_price(&self) -> Decimal {
        if self.total_bought.is_zero() {
            return Decimal::zero();
        }
        self.total_cost / self.total_bought
    }

    pub fn cost_basis(&self) -> Decimal {
        self.total_cost.mul_div(self.quantity(), self.total_bought)
    }
}

/// Positions with a positive quantity, grouped by canonical symbol and sorted by symbol.
///
/// Only trades at or before `as_of` count when it is given.
pub fn open_positions(
    trades: &[Trade],
    aliases: &TickerAliases,
    as_of: Option<TimeMs>,
) -> Vec<Position> {
    let resolver = AliasResolver::new(aliases);
    let mut grouped: BTreeMap<Symbol, Vec<&Trade>> = BTreeMap::new();
    for trade in trades {
        if as_of.is_some_and(|cutoff| trade.time() > cutoff) {
            continue;
        }
        grouped
            .entry(resolver.canonical(trade.symbol()))
            .or_default()
            .push(trade);
    }

    grouped
        .into_iter()
        .map(|(symbol, trades)| Position::from_trades(symbol, trades))
        .filter(|p| p.quantity().is_positive())
        .collect()
}
