use crate::domain::TaxYear;
use crate::engine::MatchOptions;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub trades_path: String,
    pub aliases_path: Option<String>,
    pub tax_year: Option<TaxYear>,
    pub drop_zero_price_disposals: bool,
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let trades_path = env_map
            .get("TRADES_PATH")
            .cloned()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnv("TRADES_PATH".to_string()))?;

        let aliases_path = env_map
            .get("ALIASES_PATH")
            .cloned()
            .filter(|s| !s.trim().is_empty());

        let tax_year = match env_map.get("TAX_YEAR") {
            Some(raw) => Some(raw.trim().parse::<i32>().map(TaxYear::new).map_err(|_| {
                ConfigError::InvalidValue(
                    "TAX_YEAR".to_string(),
                    "must be the year the tax year starts in, e.g. 2022".to_string(),
                )
            })?),
            None => None,
        };

        let drop_zero_price_disposals = match env_map
            .get("DROP_ZERO_PRICE_DISPOSALS")
            .map(|s| s.as_str())
            .unwrap_or("false")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "DROP_ZERO_PRICE_DISPOSALS".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let output_format = match env_map
            .get("OUTPUT_FORMAT")
            .map(|s| s.as_str())
            .unwrap_or("json")
        {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            other => {
                return Err(ConfigError::InvalidValue(
                    "OUTPUT_FORMAT".to_string(),
                    format!("must be json or csv, got {}", other),
                ))
            }
        };

        Ok(Config {
            trades_path,
            aliases_path,
            tax_year,
            drop_zero_price_disposals,
            output_format,
        })
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            drop_zero_price_disposals: self.drop_zero_price_disposals,
        }
    }
}
