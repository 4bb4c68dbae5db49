use crate::domain::{Decimal, Trade};

use super::MatchError;

/// A BUY leg plus how much of it earlier matches have consumed.
///
/// Lives only for one matching pass; counters are rebuilt from scratch each time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedTrade {
    trade: Trade,
    allocated: Decimal,
}

impl AllocatedTrade {
    pub fn new(trade: Trade) -> Self {
        Self {
            trade,
            allocated: Decimal::zero(),
        }
    }

    pub fn trade(&self) -> &Trade {
        &self.trade
    }

    pub fn allocated(&self) -> Decimal {
        self.allocated
    }

    pub fn qty_left(&self) -> Decimal {
        self.trade.qty() - self.allocated
    }

    pub fn is_exhausted(&self) -> bool {
        !self.qty_left().is_positive()
    }

    pub fn allocate(&mut self, qty: Decimal) -> Result<(), MatchError> {
        if qty > self.qty_left() || qty.is_negative() {
            return Err(MatchError::LotOverAllocated {
                identity: self.trade.identity().to_string(),
                requested: qty,
                left: self.qty_left(),
            });
        }
        self.allocated += qty;
        Ok(())
    }

    /// Take up to `wanted` units, returning how many were taken.
    pub fn allocate_up_to(&mut self, wanted: Decimal) -> Decimal {
        let take = self.qty_left().min(wanted);
        if !take.is_positive() {
            return Decimal::zero();
        }
        self.allocated += take;
        take
    }

    /// Cost in base currency of `qty` units at this trade's net unit price.
    pub fn net_price_in_base(&self, qty: Decimal) -> Decimal {
        self.trade.net_cash_in_base_for(qty)
    }
}
