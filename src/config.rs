//! Runtime configuration.
//!
//! Values come from command-line flags first, then `POKERBANK_*` environment
//! variables, then defaults.

use std::net::SocketAddr;

use thiserror::Error;

use crate::domain::{parse_cents, Cents};

pub const DEFAULT_DATABASE: &str = "pokerbank.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";
/// One buy-in at the table.
pub const DEFAULT_BUY_IN_CENTS: Cents = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file
    pub database: String,
    /// HTTP bind address for `serve`
    pub bind: SocketAddr,
    /// Symbol used in settlement descriptions
    pub currency_symbol: String,
    /// Withdrawal amount used when none is given
    pub default_buy_in_cents: Cents,
}

/// Flag values that override the environment when present.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<String>,
    pub bind: Option<String>,
    pub currency_symbol: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),

    #[error("Invalid default buy-in '{0}'")]
    InvalidBuyIn(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl Config {
    /// Resolve configuration from overrides and the process environment.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    pub fn resolve(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let database = overrides
            .database
            .or_else(|| env("POKERBANK_DB"))
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        if database.trim().is_empty() {
            return Err(ConfigError::Empty("database"));
        }

        let bind_str = overrides
            .bind
            .or_else(|| env("POKERBANK_BIND"))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str.clone()))?;

        let currency_symbol = overrides
            .currency_symbol
            .or_else(|| env("POKERBANK_CURRENCY"))
            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());
        if currency_symbol.trim().is_empty() {
            return Err(ConfigError::Empty("currency symbol"));
        }

        let default_buy_in_cents = match env("POKERBANK_BUY_IN") {
            Some(value) => match parse_cents(&value) {
                Ok(cents) if cents > 0 => cents,
                _ => return Err(ConfigError::InvalidBuyIn(value)),
            },
            None => DEFAULT_BUY_IN_CENTS,
        };

        Ok(Self {
            database,
            bind,
            currency_symbol,
            default_buy_in_cents,
        })
    }
}
