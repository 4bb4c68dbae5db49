use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::TradeError;
use crate::engine::MatchError;
use crate::store::StoreError;

/// Any failure surfaced to the user of the ledger.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid trade: {0}")]
    Trade(#[from] TradeError),
    #[error("{0}")]
    Match(#[from] MatchError),
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),
}

impl AppError {
    /// Invariant violations point at a defect rather than incomplete input.
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            AppError::Match(MatchError::PoolDesync { .. } | MatchError::LotOverAllocated { .. })
        )
    }
}
