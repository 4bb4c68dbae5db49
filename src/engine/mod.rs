//! Pure matching engine: disposals against same-day, 30-day and pooled acquisitions.

use crate::domain::{Decimal, Symbol, TimeMs, Trade};
use serde::Serialize;
use thiserror::Error;

pub mod aggregator;
pub mod allocation;
pub mod holding;
pub mod pool;
pub mod position;
pub mod totals;

pub use aggregator::match_gains;
pub use allocation::AllocatedTrade;
pub use holding::HoldingMatcher;
pub use pool::Section104Pool;
pub use position::{open_positions, Position};
pub use totals::DisposalTotals;

/// Which statutory rule matched a quantity of a disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchRule {
    #[serde(rename = "Same-day")]
    SameDay,
    #[serde(rename = "Bed & Breakfast")]
    BedAndBreakfast,
    #[serde(rename = "Section 104 Holding")]
    Section104,
}

impl MatchRule {
    pub fn display(&self) -> &'static str {
        match self {
            MatchRule::SameDay => "Same-day",
            MatchRule::BedAndBreakfast => "Bed & Breakfast",
            MatchRule::Section104 => "Section 104 Holding",
        }
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A quantity of a disposal matched to an acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyMatch {
    pub rule: MatchRule,
    pub qty: Decimal,
    pub cost_in_base: Decimal,
    /// None for pool matches; the pool has no single source trade.
    pub buy_trade: Option<Trade>,
}

/// A fully matched SELL leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Disposal {
    pub sell: Trade,
    pub canonical_symbol: Symbol,
    /// Symbol in effect on the sell date.
    pub display_symbol: Symbol,
    pub buy_matches: Vec<BuyMatch>,
}

impl Disposal {
    pub fn date(&self) -> TimeMs {
        self.sell.time()
    }

    pub fn qty(&self) -> Decimal {
        self.sell.qty()
    }

    pub fn matched_qty(&self) -> Decimal {
        self.buy_matches.iter().map(|m| m.qty).sum()
    }

    pub fn cost_in_base(&self) -> Decimal {
        self.buy_matches.iter().map(|m| m.cost_in_base).sum()
    }

    pub fn proceeds_in_base(&self) -> Decimal {
        self.sell.net_cash_in_base()
    }

    pub fn profit_in_base(&self) -> Decimal {
        self.proceeds_in_base() - self.cost_in_base()
    }
}

/// Knobs for one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Match zero-price SELL legs but leave them out of the output.
    ///
    /// Covers split legs imported without reorganization flags.
    pub drop_zero_price_disposals: bool,
}

/// Data-quality findings that do not stop a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataWarning {
    AliasCycle { symbol: Symbol },
}

/// Output of one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub disposals: Vec<Disposal>,
    pub warnings: Vec<DataWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(
        "Tried to allocate {requested} {symbol} stock from Section 104 holding but only {available} left. \
         Have you imported all trades AND corporate actions? \
         Corporate actions (ticker renames, stock splits) must be imported to link trades across symbol changes."
    )]
    InsufficientPool {
        symbol: Symbol,
        requested: Decimal,
        available: Decimal,
    },
    #[error("Section 104 bookkeeping out of sync for {symbol}: {unallocated} units could not be placed on acquisitions")]
    PoolDesync { symbol: Symbol, unallocated: Decimal },
    #[error("Cannot allocate {requested} from trade {identity}: only {left} left")]
    LotOverAllocated {
        identity: String,
        requested: Decimal,
        left: Decimal,
    },
}
