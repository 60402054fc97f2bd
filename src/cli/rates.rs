use crate::cli::ui::{self, StyleType};
use crate::core::cache::CacheView;
use crate::core::convert::{format_amount, format_grouped, unit_price};
use crate::core::rates::RateKind;
use crate::service::RateService;
use anyhow::Result;
use comfy_table::Cell;

/// Refreshes `kind` once and prints its table.
pub async fn run(service: &RateService, kind: RateKind, symbols: &[String]) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching {kind} rates..."));
    service.refresh(kind).await;
    spinner.finish_and_clear();

    println!(
        "{}",
        render(&service.get(kind), kind, service.base_currency(), symbols)
    );
    Ok(())
}

fn title(kind: RateKind, base: &str) -> String {
    match kind {
        RateKind::Fiat => format!("Exchange Rates ({base})"),
        RateKind::Crypto => format!("Crypto Prices ({base})"),
    }
}

/// Renders a cache view as a titled table, followed by its status lines.
///
/// Rows follow `symbols`; the base currency is never listed. Symbols absent
/// from the data show as `N/A`.
pub fn render(view: &CacheView, kind: RateKind, base: &str, symbols: &[String]) -> String {
    let mut out = format!("\n{}\n", ui::style_text(&title(kind, base), StyleType::Title));

    let Some(rates) = &view.data else {
        let message = match &view.error {
            Some(error) => ui::style_text(&format!("No data available: {error}"), StyleType::Error),
            None => ui::style_text("No data yet", StyleType::Subtle),
        };
        out.push_str(&message);
        return out;
    };

    let sign = ui::currency_sign(base);
    let mut table = ui::new_styled_table();
    match kind {
        RateKind::Fiat => table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("1 unit in {base}")),
            ui::header_cell(&format!("Per 1 {base}")),
        ]),
        RateKind::Crypto => table.set_header(vec![
            ui::header_cell("Coin"),
            ui::header_cell(&format!("Price in {base}")),
        ]),
    };

    let has_error = view.error.is_some();
    for symbol in symbols.iter().filter(|s| s.as_str() != base) {
        let mut row = vec![Cell::new(symbol)];
        match (kind, rates.get(symbol)) {
            (RateKind::Fiat, Some(rate)) => {
                row.push(ui::value_cell(format!(
                    "{sign}{}",
                    format_amount(unit_price(rate, kind))
                )));
                row.push(ui::value_cell(format!("{rate:.6}")));
            }
            (RateKind::Crypto, Some(rate)) => {
                let mut price = format!("{sign}{}", format_grouped(rate));
                if view.filled.contains(symbol) {
                    price.push_str(" *");
                }
                row.push(ui::value_cell(price));
            }
            (RateKind::Fiat, None) => {
                row.push(ui::na_cell(has_error));
                row.push(ui::na_cell(has_error));
            }
            (RateKind::Crypto, None) => row.push(ui::na_cell(has_error)),
        }
        table.add_row(row);
    }
    out.push_str(&table.to_string());
    out.push('\n');

    let mut status = Vec::new();
    if let Some(source) = &view.source {
        status.push(format!("Source: {source}"));
    }
    if let Some(fetched_at) = view.fetched_at {
        status.push(format!(
            "Last updated: {}",
            fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        ));
    }
    out.push_str(&ui::style_text(&status.join(" | "), StyleType::Subtle));

    if !view.filled.is_empty() {
        out.push('\n');
        out.push_str(&ui::style_text(
            &format!("* offline estimate for {}", view.filled.join(", ")),
            StyleType::Warning,
        ));
    }
    if view.is_stale {
        out.push('\n');
        out.push_str(&ui::style_text(
            "Data is stale, showing last known values",
            StyleType::Warning,
        ));
    }
    if let Some(error) = &view.error {
        out.push('\n');
        out.push_str(&ui::style_text(
            &format!("Last refresh failed: {error}"),
            StyleType::Error,
        ));
    }
    out
}
