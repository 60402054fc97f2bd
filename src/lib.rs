pub mod cli;
pub mod core;
pub mod providers;
pub mod service;

use crate::core::config::AppConfig;
use crate::core::convert::Amount;
use crate::core::rates::RateKind;
use crate::service::RateService;
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Fiat exchange rates table
    Rates,
    /// Crypto prices table
    Crypto,
    /// Convert an amount into the base currency
    Convert {
        amount: Amount,
        currency: String,
        crypto: bool,
    },
    /// Live dashboard refreshed in the background
    Watch,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxdash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        base = %config.base_currency,
        fiat = ?config.fiat.symbols,
        coins = config.crypto.coins.len(),
        "Loaded config"
    );

    let service = RateService::from_config(&config)?;
    let crypto_symbols: Vec<String> = config
        .crypto
        .coins
        .iter()
        .map(|c| c.symbol.clone())
        .collect();

    match command {
        AppCommand::Rates => {
            cli::rates::run(&service, RateKind::Fiat, &config.fiat.symbols).await
        }
        AppCommand::Crypto => cli::rates::run(&service, RateKind::Crypto, &crypto_symbols).await,
        AppCommand::Convert {
            amount,
            currency,
            crypto,
        } => {
            let mode = if crypto {
                RateKind::Crypto
            } else {
                RateKind::Fiat
            };
            cli::convert::run(&service, amount, &currency.to_uppercase(), mode).await
        }
        AppCommand::Watch => {
            cli::watch::run(&service, &config.fiat.symbols, &crypto_symbols).await
        }
    }
}
