//! Trade type representing one buy/sell leg, market or corporate action.

use crate::domain::{Currency, Decimal, Side, Symbol, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures raised while constructing a [`Trade`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeError {
    #[error("Commission currency {commission} is not same currency as market currency {market}")]
    CurrencyMismatch { market: String, commission: String },
    #[error("Buy/Sell was {0}")]
    InvalidSide(String),
    #[error("Trade symbol must not be empty")]
    EmptySymbol,
    #[error("Trade at {0} has no external identifier")]
    MissingIdentifier(TimeMs),
    #[error("FX rate must not be negative, got {0}")]
    NegativeFxRate(Decimal),
}

/// Input fields for a new trade, as supplied by the import layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeFields {
    pub time: TimeMs,
    pub symbol: Symbol,
    pub side: Side,
    pub currency: Currency,
    pub qty: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub commission_currency: Currency,
    pub fx_rate: Decimal,
    pub trade_id: Option<String>,
    pub is_reorganization: bool,
    pub is_reorganization_buy: bool,
}

/// Persisted shape of a trade. `dateTime` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub date_time: i64,
    pub symbol: String,
    pub buy_or_sell: String,
    pub currency: String,
    pub qty: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub commission_currency: String,
    pub fx_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(default)]
    pub is_reorganization: bool,
    #[serde(default)]
    pub is_reorganization_buy: bool,
}

/// One immutable transaction leg.
///
/// Only the two reorganization flags may change after construction, when a
/// later corporate-action import reclassifies the leg as part of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trade {
    identity: String,
    time: TimeMs,
    symbol: Symbol,
    side: Side,
    currency: Currency,
    qty: Decimal,
    price: Decimal,
    commission: Decimal,
    commission_currency: Currency,
    fx_rate: Decimal,
    trade_id: Option<String>,
    is_reorganization: bool,
    is_reorganization_buy: bool,
}

impl Trade {
    /// Create a trade from freshly imported fields. An identifier is required.
    pub fn new(fields: TradeFields) -> Result<Self, TradeError> {
        if normalize_id(fields.trade_id.clone()).is_none() {
            return Err(TradeError::MissingIdentifier(fields.time));
        }
        Self::build(fields)
    }

    /// Rebuild a trade from its persisted record, recomputing the identity.
    ///
    /// Records written before identifiers were tracked fall back to a content hash.
    pub fn from_record(record: TradeRecord) -> Result<Self, TradeError> {
        let side = record
            .buy_or_sell
            .parse::<Side>()
            .map_err(|e| TradeError::InvalidSide(e.0))?;
        Self::build(TradeFields {
            time: TimeMs::new(record.date_time),
            symbol: Symbol::new(record.symbol),
            side,
            currency: Currency::new(record.currency),
            qty: record.qty,
            price: record.price,
            commission: record.commission,
            commission_currency: Currency::new(record.commission_currency),
            fx_rate: record.fx_rate,
            trade_id: record.trade_id,
            is_reorganization: record.is_reorganization,
            is_reorganization_buy: record.is_reorganization_buy,
        })
    }

    fn build(fields: TradeFields) -> Result<Self, TradeError> {
        if fields.symbol.as_str().trim().is_empty() {
            return Err(TradeError::EmptySymbol);
        }
        if fields.currency != fields.commission_currency {
            return Err(TradeError::CurrencyMismatch {
                market: fields.currency.0,
                commission: fields.commission_currency.0,
            });
        }
        if fields.fx_rate.is_negative() {
            return Err(TradeError::NegativeFxRate(fields.fx_rate));
        }

        let trade_id = normalize_id(fields.trade_id);
        let qty = fields.qty.abs();
        let commission = fields.commission.abs();
        let identity = Self::compute_identity(
            trade_id.as_deref(),
            fields.time,
            &fields.symbol,
            fields.side,
            &fields.currency,
            &fields.price,
            &qty,
            &commission,
            &fields.commission_currency,
        );

        Ok(Trade {
            identity,
            time: fields.time,
            symbol: fields.symbol,
            side: fields.side,
            currency: fields.currency,
            qty,
            price: fields.price,
            commission,
            commission_currency: fields.commission_currency,
            fx_rate: fields.fx_rate,
            trade_id,
            is_reorganization: fields.is_reorganization,
            is_reorganization_buy: fields.is_reorganization_buy,
        })
    }

    /// Stable identity of a trade.
    ///
    /// Priority: external identifier (if present) > hash of economic fields.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_identity(
        trade_id: Option<&str>,
        time: TimeMs,
        symbol: &Symbol,
        side: Side,
        currency: &Currency,
        price: &Decimal,
        qty: &Decimal,
        commission: &Decimal,
        commission_currency: &Currency,
    ) -> String {
        if let Some(id) = trade_id {
            return format!("id:{}", id);
        }

        use sha2::{Digest, Sha256};

        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        let mut hasher = Sha256::new();
        hasher.update(time.as_ms().to_le_bytes());
        hash_var(&mut hasher, symbol.as_str());
        hash_var(&mut hasher, side.as_str());
        hash_var(&mut hasher, currency.as_str());
        hash_var(&mut hasher, &price.to_canonical_string());
        hash_var(&mut hasher, &qty.to_canonical_string());
        hash_var(&mut hasher, &commission.to_canonical_string());
        hash_var(&mut hasher, commission_currency.as_str());
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }

    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            date_time: self.time.as_ms(),
            symbol: self.symbol.0.clone(),
            buy_or_sell: self.side.as_str().to_string(),
            currency: self.currency.0.clone(),
            qty: self.qty,
            price: self.price,
            commission: self.commission,
            commission_currency: self.commission_currency.0.clone(),
            fx_rate: self.fx_rate,
            trade_id: self.trade_id.clone(),
            is_reorganization: self.is_reorganization,
            is_reorganization_buy: self.is_reorganization_buy,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn time(&self) -> TimeMs {
        self.time
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn qty(&self) -> Decimal {
        self.qty
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn commission(&self) -> Decimal {
        self.commission
    }

    pub fn fx_rate(&self) -> Decimal {
        self.fx_rate
    }

    pub fn trade_id(&self) -> Option<&str> {
        self.trade_id.as_deref()
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    pub fn is_sell(&self) -> bool {
        self.side == Side::Sell
    }

    pub fn is_reorganization(&self) -> bool {
        self.is_reorganization
    }

    pub fn is_reorganization_buy(&self) -> bool {
        self.is_reorganization_buy
    }

    pub fn set_reorganization(&mut self, value: bool) {
        self.is_reorganization = value;
    }

    pub fn set_reorganization_buy(&mut self, value: bool) {
        self.is_reorganization_buy = value;
    }

    /// qty × price, plus commission for buys, minus it for sells.
    pub fn net_cash(&self) -> Decimal {
        let gross = self.qty * self.price;
        match self.side {
            Side::Buy => gross + self.commission,
            Side::Sell => gross - self.commission,
        }
    }

    pub fn net_cash_in_base(&self) -> Decimal {
        self.net_cash() * self.fx_rate
    }

    /// Net cash in base currency attributable to `qty` units of this trade.
    pub fn net_cash_in_base_for(&self, qty: Decimal) -> Decimal {
        self.net_cash().mul_div(qty, self.qty) * self.fx_rate
    }
}

fn normalize_id(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
