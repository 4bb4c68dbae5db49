//! Ticker rename history and symbol resolution.
//!
//! Keys of [`TickerAliases`] are the symbols that were renamed; each maps to
//! the date-ordered list of names it was renamed to. A chain A→B→C is stored
//! as `A: [B]` and `B: [C]`.

use crate::domain::{Symbol, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// One rename event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerRename {
    /// Effective date, epoch milliseconds.
    pub date: TimeMs,
    pub new_symbol: Symbol,
}

impl TickerRename {
    pub fn new(date: TimeMs, new_symbol: impl Into<String>) -> Self {
        Self {
            date,
            new_symbol: Symbol::new(new_symbol),
        }
    }
}

/// Map from a renamed symbol to its date-ordered renames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickerAliases(BTreeMap<Symbol, Vec<TickerRename>>);

impl TickerAliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&[TickerRename]> {
        self.0.get(symbol).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Vec<TickerRename>)> {
        self.0.iter()
    }

    /// Record a rename, keeping the list sorted and free of duplicates.
    pub fn insert(&mut self, symbol: Symbol, rename: TickerRename) {
        let renames = self.0.entry(symbol).or_default();
        if !renames.contains(&rename) {
            renames.push(rename);
            renames.sort_by_key(|r| r.date);
        }
    }

    /// Merge renames from another import; duplicate (date, new symbol) pairs are dropped.
    pub fn merge(&mut self, other: &TickerAliases) {
        for (symbol, renames) in &other.0 {
            for rename in renames {
                self.insert(symbol.clone(), rename.clone());
            }
        }
    }

    /// Replace a key's renames wholesale, sorting them by date.
    pub(crate) fn set(&mut self, symbol: Symbol, mut renames: Vec<TickerRename>) {
        renames.sort_by_key(|r| r.date);
        renames.dedup();
        self.0.insert(symbol, renames);
    }
}

/// Outcome of walking the rename graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub symbol: Symbol,
    /// True when the walk stopped because it revisited a symbol.
    pub cycle_detected: bool,
}

/// Resolves symbols against a [`TickerAliases`] map.
///
/// Holds a reverse index (new symbol → renamed symbol) so each backward step
/// is a single lookup.
#[derive(Debug)]
pub struct AliasResolver<'a> {
    aliases: &'a TickerAliases,
    parents: HashMap<&'a Symbol, &'a Symbol>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(aliases: &'a TickerAliases) -> Self {
        let mut parents = HashMap::new();
        for (original, renames) in aliases.iter() {
            for rename in renames {
                // First writer wins; BTreeMap iteration keeps this deterministic.
                parents.entry(&rename.new_symbol).or_insert(original);
            }
        }
        Self { aliases, parents }
    }

    /// Walk back to the earliest ancestor of `symbol`.
    pub fn resolve_canonical(&self, symbol: &Symbol) -> Resolution {
        let mut visited: HashSet<&Symbol> = HashSet::new();
        let mut current = symbol;
        loop {
            if !visited.insert(current) {
                tracing::warn!(symbol = %current, "cycle in ticker alias data");
                return Resolution {
                    symbol: current.clone(),
                    cycle_detected: true,
                };
            }
            match self.parents.get(current) {
                Some(parent) => current = *parent,
                None => {
                    return Resolution {
                        symbol: current.clone(),
                        cycle_detected: false,
                    }
                }
            }
        }
    }

    pub fn canonical(&self, symbol: &Symbol) -> Symbol {
        self.resolve_canonical(symbol).symbol
    }

    /// Walk forward from `canonical` to the name in effect on `as_of`.
    pub fn resolve_display(&self, canonical: &Symbol, as_of: TimeMs) -> Resolution {
        let mut visited: HashSet<&Symbol> = HashSet::new();
        let mut current = canonical;
        loop {
            if !visited.insert(current) {
                tracing::warn!(symbol = %current, "cycle in ticker alias data");
                return Resolution {
                    symbol: current.clone(),
                    cycle_detected: true,
                };
            }
            let next = self.aliases.get(current).and_then(|renames| {
                renames
                    .iter()
                    .take_while(|r| r.date <= as_of)
                    .last()
                    .map(|r| &r.new_symbol)
            });
            match next {
                Some(next) if next != current => current = next,
                _ => {
                    return Resolution {
                        symbol: current.clone(),
                        cycle_detected: false,
                    }
                }
            }
        }
    }

    pub fn display(&self, canonical: &Symbol, as_of: TimeMs) -> Symbol {
        self.resolve_display(canonical, as_of).symbol
    }
}
