//! Section 104 average-cost pool.

use crate::domain::{Decimal, Symbol};
use std::collections::HashMap;

use super::{AllocatedTrade, MatchError};

/// Pooled holding of every BUY remainder left after same-day and 30-day matching.
///
/// Pool cost / pool quantity is the average unit cost; allocations remove a
/// proportional share of cost so the average is preserved.
#[derive(Debug, Clone)]
pub struct Section104Pool {
    symbol: Symbol,
    /// BUY legs in chronological order.
    lots: Vec<AllocatedTrade>,
    /// Legs whose remaining shares were replaced by a later reorganization buy.
    claimed_by_reorg: Vec<bool>,
    /// Cost basis each reorganization buy took over, by position in `lots`.
    inherited_cost: HashMap<usize, Decimal>,
    qty: Decimal,
    cost_in_base: Decimal,
}

impl Section104Pool {
    /// Build the pool from the holding's BUY legs in their current allocation state.
    pub fn new(symbol: Symbol, lots: Vec<AllocatedTrade>) -> Self {
        let mut lots: Vec<AllocatedTrade> =
            lots.into_iter().filter(|l| l.trade().is_buy()).collect();
        lots.sort_by_key(|l| l.trade().time());

        let mut claimed_by_reorg = vec![false; lots.len()];
        let mut inherited_cost = HashMap::new();

        for reorg_index in 0..lots.len() {
            if !lots[reorg_index].trade().is_reorganization_buy() {
                continue;
            }
            let reorg_time = lots[reorg_index].trade().time();
            let mut cost = Decimal::zero();
            let mut replaced_qty = Decimal::zero();

            for (index, prior) in lots.iter().enumerate() {
                if claimed_by_reorg[index]
                    || prior.trade().is_reorganization_buy()
                    || prior.is_exhausted()
                    || prior.trade().time() >= reorg_time
                {
                    continue;
                }
                cost += prior.net_price_in_base(prior.qty_left());
                replaced_qty += prior.qty_left();
                claimed_by_reorg[index] = true;
            }

            tracing::debug!(
                symbol = %symbol,
                reorg_trade = lots[reorg_index].trade().identity(),
                replaced_qty = %replaced_qty,
                inherited_cost = %cost,
                "reorganization buy inherits cost basis"
            );
            inherited_cost.insert(reorg_index, cost);
        }

        let mut qty = Decimal::zero();
        let mut cost_in_base = Decimal::zero();
        for (index, lot) in lots.iter().enumerate() {
            if claimed_by_reorg[index] || lot.is_exhausted() {
                continue;
            }
            let left = lot.qty_left();
            qty += left;
            cost_in_base += match inherited_cost.get(&index) {
                Some(inherited) => inherited.mul_div(left, lot.trade().qty()),
                None => lot.net_price_in_base(left),
            };
        }

        tracing::debug!(symbol = %symbol, qty = %qty, cost_in_base = %cost_in_base, "section 104 pool built");

        Self {
            symbol,
            lots,
            claimed_by_reorg,
            inherited_cost,
            qty,
            cost_in_base,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn qty(&self) -> Decimal {
        self.qty
    }

    pub fn cost_in_base(&self) -> Decimal {
        self.cost_in_base
    }

    /// Current average unit cost, or None for an empty pool.
    pub fn average_cost(&self) -> Option<Decimal> {
        if self.qty.is_zero() {
            None
        } else {
            Some(self.cost_in_base / self.qty)
        }
    }

    pub fn lots(&self) -> &[AllocatedTrade] {
        &self.lots
    }

    /// Cost basis a reorganization buy inherited, looked up by trade identity.
    pub fn inherited_cost(&self, identity: &str) -> Option<Decimal> {
        self.position_of(identity)
            .and_then(|index| self.inherited_cost.get(&index).copied())
    }

    pub fn is_claimed_by_reorg(&self, identity: &str) -> bool {
        self.position_of(identity)
            .map(|index| self.claimed_by_reorg[index])
            .unwrap_or(false)
    }

    fn position_of(&self, identity: &str) -> Option<usize> {
        self.lots
            .iter()
            .position(|l| l.trade().identity() == identity)
    }

    /// Allocate `qty` units from the pool, returning their cost in base currency.
    ///
    /// Fails without touching the pool when it holds less than `qty`.
    pub fn allocate(&mut self, qty: Decimal) -> Result<Decimal, MatchError> {
        if !qty.is_positive() {
            return Ok(Decimal::zero());
        }
        if qty > self.qty {
            return Err(MatchError::InsufficientPool {
                symbol: self.symbol.clone(),
                requested: qty,
                available: self.qty,
            });
        }

        let cost = if qty == self.qty {
            self.cost_in_base
        } else {
            self.cost_in_base.mul_div(qty, self.qty)
        };

        self.allocate_lots(qty)?;
        self.cost_in_base -= cost;
        self.qty -= qty;

        tracing::debug!(
            symbol = %self.symbol,
            qty = %qty,
            cost = %cost,
            pool_qty = %self.qty,
            pool_cost = %self.cost_in_base,
            "section 104 allocation"
        );

        Ok(cost)
    }

    /// Spread a pool allocation over the underlying legs, oldest first.
    fn allocate_lots(&mut self, qty: Decimal) -> Result<(), MatchError> {
        let mut remaining = qty;
        for (index, lot) in self.lots.iter_mut().enumerate() {
            if self.claimed_by_reorg[index] {
                continue;
            }
            let take = lot.qty_left().min(remaining);
            if !take.is_positive() {
                continue;
            }
            lot.allocate(take)?;
            remaining -= take;
            if remaining.is_zero() {
                break;
            }
        }

        if remaining.is_positive() {
            tracing::error!(
                symbol = %self.symbol,
                unallocated = %remaining,
                "pool quantity exceeds what its acquisitions can supply"
            );
            return Err(MatchError::PoolDesync {
                symbol: self.symbol.clone(),
                unallocated: remaining,
            });
        }
        Ok(())
    }
}
