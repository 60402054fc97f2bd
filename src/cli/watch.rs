use crate::cli::rates;
use crate::cli::ui::{self, StyleType};
use crate::core::rates::RateKind;
use crate::service::RateService;
use anyhow::{Context, Result};
use console::Term;
use std::time::Duration;
use tracing::info;

const REDRAW_EVERY: Duration = Duration::from_secs(2);

/// Starts background refreshing and redraws both tables until Ctrl-C.
pub async fn run(
    service: &RateService,
    fiat_symbols: &[String],
    crypto_symbols: &[String],
) -> Result<()> {
    service.start();
    let term = Term::stdout();
    let mut redraw = tokio::time::interval(REDRAW_EVERY);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted, stopping");
                break;
            }
            _ = redraw.tick() => {
                // Clearing fails harmlessly when stdout is not a terminal
                let _ = term.clear_screen();
                println!("{}", screen(service, fiat_symbols, crypto_symbols));
            }
        }
    }

    service.stop();
    Ok(())
}

fn screen(service: &RateService, fiat_symbols: &[String], crypto_symbols: &[String]) -> String {
    let base = service.base_currency();
    let mut out = rates::render(&service.get(RateKind::Fiat), RateKind::Fiat, base, fiat_symbols);
    out.push('\n');
    out.push_str(&rates::render(
        &service.get(RateKind::Crypto),
        RateKind::Crypto,
        base,
        crypto_symbols,
    ));
    out.push_str("\n\n");
    out.push_str(&ui::style_text("Press Ctrl-C to exit", StyleType::Subtle));
    out
}
