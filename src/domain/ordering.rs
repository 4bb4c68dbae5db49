//! Trade ordering and identity-based dedupe.

use crate::domain::Trade;
use std::collections::HashMap;

/// Stable chronological sort; trades at the same instant keep their input order.
pub fn sort_trades_chronological(trades: &mut [Trade]) {
    trades.sort_by_key(|t| t.time());
}

/// Drop repeated trades by identity, keeping the first-seen position.
///
/// Reorganization flags on later duplicates are merged into the kept trade,
/// so re-importing a corporate-action file can classify already-stored legs.
pub fn dedupe_trades(trades: Vec<Trade>) -> Vec<Trade> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<Trade> = Vec::with_capacity(trades.len());

    for trade in trades {
        match seen.get(trade.identity()) {
            Some(&index) => {
                let kept = &mut deduped[index];
                if trade.is_reorganization() {
                    kept.set_reorganization(true);
                }
                if trade.is_reorganization_buy() {
                    kept.set_reorganization_buy(true);
                }
            }
            None => {
                seen.insert(trade.identity().to_string(), deduped.len());
                deduped.push(trade);
            }
        }
    }

    deduped
}
