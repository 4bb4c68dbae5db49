use crate::domain::{Decimal, TaxYear};
use serde::Serialize;

use super::Disposal;

/// Aggregate cost, proceeds and profit in base currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalTotals {
    pub count: usize,
    pub cost_in_base: Decimal,
    pub proceeds_in_base: Decimal,
    pub profit_in_base: Decimal,
}

impl DisposalTotals {
    pub fn from_disposals<'a>(disposals: impl IntoIterator<Item = &'a Disposal>) -> Self {
        disposals
            .into_iter()
            .fold(Self::default(), |mut totals, disposal| {
                totals.count += 1;
                totals.cost_in_base += disposal.cost_in_base();
                totals.proceeds_in_base += disposal.proceeds_in_base();
                totals.profit_in_base += disposal.profit_in_base();
                totals
            })
    }

    /// Totals for disposals whose sell date falls in `year`.
    pub fn for_tax_year(disposals: &[Disposal], year: TaxYear) -> Self {
        Self::from_disposals(disposals.iter().filter(|d| year.contains(d.date())))
    }
}
