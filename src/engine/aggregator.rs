//! Full matching pass over an alias-normalized transaction list.

use crate::domain::{AliasResolver, Symbol, TickerAliases, Trade};
use std::collections::{BTreeSet, HashMap};

use super::{DataWarning, Disposal, HoldingMatcher, MatchError, MatchOptions, MatchReport};

/// Holding matcher plus the sells routed to it, tagged with their input position.
struct HoldingBatch {
    holding: HoldingMatcher,
    sells: Vec<(usize, Trade)>,
}

/// Match every SELL leg in `trades` and return disposals in input order.
///
/// Trades are grouped by canonical symbol so history under old and new
/// tickers shares one holding. Reorganization SELL legs are not disposals
/// and are skipped. A shortfall in any holding aborts the whole pass.
pub fn match_gains(
    trades: &[Trade],
    aliases: &TickerAliases,
    options: &MatchOptions,
) -> Result<MatchReport, MatchError> {
    let resolver = AliasResolver::new(aliases);
    let mut cycle_symbols: BTreeSet<Symbol> = BTreeSet::new();
    let mut canonical_cache: HashMap<&Symbol, Symbol> = HashMap::new();

    let mut order: Vec<Symbol> = Vec::new();
    let mut batches: HashMap<Symbol, HoldingBatch> = HashMap::new();

    for (position, trade) in trades.iter().enumerate() {
        let canonical = canonical_cache
            .entry(trade.symbol())
            .or_insert_with(|| {
                let resolution = resolver.resolve_canonical(trade.symbol());
                if resolution.cycle_detected {
                    cycle_symbols.insert(trade.symbol().clone());
                }
                resolution.symbol
            })
            .clone();

        let batch = batches.entry(canonical.clone()).or_insert_with(|| {
            order.push(canonical.clone());
            HoldingBatch {
                holding: HoldingMatcher::new(canonical.clone()),
                sells: Vec::new(),
            }
        });
        batch.holding.seed(trade);

        if trade.is_sell() {
            if trade.is_reorganization() {
                tracing::debug!(trade = trade.identity(), symbol = %trade.symbol(), "skipping reorganization sell leg");
                continue;
            }
            batch.sells.push((position, trade.clone()));
        }
    }

    let mut indexed: Vec<(usize, Disposal)> = Vec::new();
    for symbol in &order {
        let Some(batch) = batches.remove(symbol) else {
            continue;
        };
        if batch.sells.is_empty() {
            continue;
        }
        let (positions, sells): (Vec<usize>, Vec<Trade>) = batch.sells.into_iter().unzip();
        let disposals = batch.holding.match_disposals(sells)?;
        indexed.extend(positions.into_iter().zip(disposals));
    }
    indexed.sort_by_key(|(position, _)| *position);

    let total_matched = indexed.len();
    let disposals: Vec<Disposal> = indexed
        .into_iter()
        .map(|(_, mut disposal)| {
            let display = resolver.resolve_display(&disposal.canonical_symbol, disposal.date());
            if display.cycle_detected {
                cycle_symbols.insert(disposal.canonical_symbol.clone());
            }
            disposal.display_symbol = display.symbol;
            disposal
        })
        .filter(|disposal| {
            !(options.drop_zero_price_disposals && disposal.sell.price().is_zero())
        })
        .collect();

    tracing::info!(
        trades = trades.len(),
        holdings = order.len(),
        matched = total_matched,
        emitted = disposals.len(),
        "matching pass complete"
    );

    let warnings = cycle_symbols
        .into_iter()
        .map(|symbol| DataWarning::AliasCycle { symbol })
        .collect();

    Ok(MatchReport {
        disposals,
        warnings,
    })
}
