//! Per-symbol matching of disposals against acquisitions.

use crate::domain::{Decimal, Symbol, TimeMs, Trade, DAY_MS};

use super::{AllocatedTrade, BuyMatch, Disposal, MatchError, MatchRule, Section104Pool};

/// Length of the bed & breakfast window.
pub const BED_AND_BREAKFAST_WINDOW_MS: i64 = 30 * DAY_MS;

/// True when both trades fall on the same UTC calendar date.
pub fn is_same_day(buy: &Trade, sell: &Trade) -> bool {
    match (buy.time().utc_date(), sell.time().utc_date()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// True when `0 <= sell - buy < 30 days`.
pub fn is_within_30_days(buy: &Trade, sell: &Trade) -> bool {
    match sell.time().as_ms().checked_sub(buy.time().as_ms()) {
        Some(diff) => (0..BED_AND_BREAKFAST_WINDOW_MS).contains(&diff),
        None => false,
    }
}

/// True when a reorganization between `buy` and `sell` replaced the bought shares.
///
/// Such shares only exist in the pool, as the cost the reorganization buy inherited.
fn is_replaced_before(buy: &Trade, sell: &Trade, reorg_times: &[TimeMs]) -> bool {
    !buy.is_reorganization_buy()
        && reorg_times
            .iter()
            .any(|&reorg| buy.time() < reorg && reorg <= sell.time())
}

/// A sell being matched, with the quantity no rule has covered yet.
struct PendingSell {
    sell: Trade,
    remaining: Decimal,
    buy_matches: Vec<BuyMatch>,
}

/// Matching state for one canonical symbol.
///
/// Holds every BUY leg of the symbol (under any of its historical tickers)
/// wrapped in an allocation counter. Consumed by [`HoldingMatcher::match_disposals`],
/// so counters never leak into a second pass.
#[derive(Debug, Clone)]
pub struct HoldingMatcher {
    symbol: Symbol,
    lots: Vec<AllocatedTrade>,
}

impl HoldingMatcher {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            lots: Vec::new(),
        }
    }

    /// Build a matcher from all trades that resolve to `symbol`.
    pub fn from_trades<'a>(symbol: Symbol, trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut holding = Self::new(symbol);
        for trade in trades {
            holding.seed(trade);
        }
        holding
    }

    /// Add a trade of this holding. Only BUY legs become acquisitions.
    pub fn seed(&mut self, trade: &Trade) {
        if trade.is_buy() {
            self.lots.push(AllocatedTrade::new(trade.clone()));
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn lots(&self) -> &[AllocatedTrade] {
        &self.lots
    }

    /// Match a batch of SELL legs, returning one disposal per sell in input order.
    ///
    /// Rules run in precedence over the whole batch: same-day, then 30-day,
    /// then the Section 104 pool, which is only built if quantity remains.
    pub fn match_disposals(mut self, sells: Vec<Trade>) -> Result<Vec<Disposal>, MatchError> {
        let mut pending: Vec<PendingSell> = sells
            .into_iter()
            .filter(|t| t.is_sell())
            .map(|sell| PendingSell {
                remaining: sell.qty(),
                sell,
                buy_matches: Vec::new(),
            })
            .collect();

        self.match_rule(&mut pending, MatchRule::SameDay, is_same_day);
        self.match_rule(&mut pending, MatchRule::BedAndBreakfast, is_within_30_days);

        if pending.iter().any(|p| p.remaining.is_positive()) {
            let mut pool = Section104Pool::new(self.symbol.clone(), self.lots);
            for p in pending.iter_mut().filter(|p| p.remaining.is_positive()) {
                let cost_in_base = pool.allocate(p.remaining)?;
                p.buy_matches.push(BuyMatch {
                    rule: MatchRule::Section104,
                    qty: p.remaining,
                    cost_in_base,
                    buy_trade: None,
                });
                p.remaining = Decimal::zero();
            }
        }

        Ok(pending
            .into_iter()
            .map(|p| Disposal {
                display_symbol: p.sell.symbol().clone(),
                canonical_symbol: self.symbol.clone(),
                sell: p.sell,
                buy_matches: p.buy_matches,
            })
            .collect())
    }

    /// Apply one identification rule to every sell that still has quantity left.
    fn match_rule(
        &mut self,
        pending: &mut [PendingSell],
        rule: MatchRule,
        eligible: fn(&Trade, &Trade) -> bool,
    ) {
        let reorg_times: Vec<TimeMs> = self
            .lots
            .iter()
            .filter(|l| l.trade().is_reorganization_buy())
            .map(|l| l.trade().time())
            .collect();

        for p in pending.iter_mut() {
            if !p.remaining.is_positive() {
                continue;
            }
            for lot in self.lots.iter_mut() {
                // Split legs only carry inherited cost inside the pool.
                if lot.trade().is_reorganization_buy()
                    || is_replaced_before(lot.trade(), &p.sell, &reorg_times)
                    || !eligible(lot.trade(), &p.sell)
                {
                    continue;
                }
                let taken = lot.allocate_up_to(p.remaining);
                if taken.is_zero() {
                    continue;
                }
                p.buy_matches.push(BuyMatch {
                    rule,
                    qty: taken,
                    cost_in_base: lot.net_price_in_base(taken),
                    buy_trade: Some(lot.trade().clone()),
                });
                p.remaining -= taken;
                if p.remaining.is_zero() {
                    break;
                }
            }
        }
    }
}
