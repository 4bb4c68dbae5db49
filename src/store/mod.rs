//! Persisted format for trades and ticker aliases.
//!
//! Trades are a JSON array of [`TradeRecord`]s; aliases are an object mapping
//! each renamed symbol to `[{ "date": <epoch ms>, "newSymbol": "..." }]`.
//! A document of the wrong shape is an error; a malformed entry inside a
//! well-formed document is logged and skipped.

use crate::domain::{Symbol, TickerAliases, TickerRename, TimeMs, Trade, TradeRecord};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid data in storage: {0} is not an array")]
    NotAnArray(&'static str),
    #[error("Invalid data in storage: {0} is not an object")]
    NotAnObject(&'static str),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn serialize_trades(trades: &[Trade]) -> Result<String, StoreError> {
    let records: Vec<TradeRecord> = trades.iter().map(Trade::to_record).collect();
    Ok(serde_json::to_string(&records)?)
}

/// Parse persisted trades, skipping entries that do not form a valid trade.
pub fn deserialize_trades(json: &str) -> Result<Vec<Trade>, StoreError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(StoreError::NotAnArray("trades"));
    };

    let mut trades = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let record: TradeRecord = match serde_json::from_value(entry) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed trade entry");
                continue;
            }
        };
        match Trade::from_record(record) {
            Ok(trade) => trades.push(trade),
            Err(e) => tracing::warn!(index, error = %e, "skipping invalid trade entry"),
        }
    }
    Ok(trades)
}

pub fn serialize_aliases(aliases: &TickerAliases) -> Result<String, StoreError> {
    Ok(serde_json::to_string(aliases)?)
}

/// Parse persisted aliases, skipping symbols and renames of the wrong shape.
pub fn deserialize_aliases(json: &str) -> Result<TickerAliases, StoreError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(entries) = value else {
        return Err(StoreError::NotAnObject("ticker aliases"));
    };

    let mut aliases = TickerAliases::new();
    for (symbol, renames) in entries {
        let Value::Array(renames) = renames else {
            tracing::warn!(symbol = %symbol, "expected array of renames, skipping symbol");
            continue;
        };
        let parsed: Vec<TickerRename> = renames
            .into_iter()
            .filter_map(|rename| match parse_rename(&rename) {
                Some(rename) => Some(rename),
                None => {
                    tracing::warn!(symbol = %symbol, entry = %rename, "skipping malformed rename");
                    None
                }
            })
            .collect();
        aliases.set(Symbol::new(symbol), parsed);
    }
    Ok(aliases)
}

fn parse_rename(value: &Value) -> Option<TickerRename> {
    let date = value.get("date")?.as_i64()?;
    let new_symbol = value.get("newSymbol")?.as_str()?;
    if new_symbol.trim().is_empty() {
        return None;
    }
    Some(TickerRename::new(TimeMs::new(date), new_symbol))
}

pub fn load_trades(path: impl AsRef<Path>) -> Result<Vec<Trade>, StoreError> {
    let json = std::fs::read_to_string(path)?;
    deserialize_trades(&json)
}

pub fn save_trades(path: impl AsRef<Path>, trades: &[Trade]) -> Result<(), StoreError> {
    std::fs::write(path, serialize_trades(trades)?)?;
    Ok(())
}

pub fn load_aliases(path: impl AsRef<Path>) -> Result<TickerAliases, StoreError> {
    let json = std::fs::read_to_string(path)?;
    deserialize_aliases(&json)
}

pub fn save_aliases(path: impl AsRef<Path>, aliases: &TickerAliases) -> Result<(), StoreError> {
    std::fs::write(path, serialize_aliases(aliases)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_entries_of_wrong_shape_are_skipped() {
        let json = r#"[
            {"dateTime": 1000, "symbol": "XYZ", "buyOrSell": "BUY", "currency": "USD",
             "qty": 10, "price": 2.5, "commission": 1, "commissionCurrency": "USD",
             "fxRate": 1, "tradeId": "t1"},
            "not a trade",
            {"dateTime": 2000, "symbol": "XYZ", "buyOrSell": "HOLD", "currency": "USD",
             "qty": 1, "price": 1, "commission": 0, "commissionCurrency": "USD", "fxRate": 1},
            {"dateTime": 3000, "symbol": "XYZ"}
        ]"#;
        let trades = deserialize_trades(json).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].identity(), "id:t1");
        assert!(!trades[0].is_reorganization());
    }

    #[test]
    fn test_trades_document_must_be_array() {
        assert!(matches!(
            deserialize_trades(r#"{"a": 1}"#),
            Err(StoreError::NotAnArray(_))
        ));
        assert!(matches!(deserialize_trades("{"), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_aliases_skip_malformed_entries() {
        let json = r#"{
            "FB": [{"date": 2000, "newSymbol": "META"}, {"date": "soon"}, 42],
            "BAD": "not an array",
            "OLD": [{"date": 3000, "newSymbol": "NEW"}, {"date": 1000, "newSymbol": "MID"}]
        }"#;
        let aliases = deserialize_aliases(json).unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.get(&Symbol::new("FB")).unwrap().len(), 1);
        let old = aliases.get(&Symbol::new("OLD")).unwrap();
        assert_eq!(old[0].new_symbol, Symbol::new("MID"));
        assert_eq!(old[1].new_symbol, Symbol::new("NEW"));
    }

    #[test]
    fn test_alias_serialized_shape() {
        let mut aliases = TickerAliases::new();
        aliases.insert(Symbol::new("FB"), TickerRename::new(TimeMs::new(2000), "META"));
        let json = serialize_aliases(&aliases).unwrap();
        assert_eq!(json, r#"{"FB":[{"date":2000,"newSymbol":"META"}]}"#);
        assert_eq!(deserialize_aliases(&json).unwrap(), aliases);
    }

    #[test]
    fn test_aliases_document_must_be_object() {
        assert!(matches!(
            deserialize_aliases("[]"),
            Err(StoreError::NotAnObject(_))
        ));
    }
}
