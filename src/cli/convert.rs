use crate::cli::ui::{self, StyleType};
use crate::core::convert::Amount;
use crate::core::rates::RateKind;
use crate::service::RateService;
use anyhow::Result;

pub async fn run(
    service: &RateService,
    amount: Amount,
    currency: &str,
    mode: RateKind,
) -> Result<()> {
    let spinner = ui::new_spinner(&format!("Fetching {mode} rates..."));
    service.refresh(mode).await;
    spinner.finish_and_clear();

    println!("{}", render(service, amount, currency, mode));
    Ok(())
}

/// One line result, plus a note when the figure is zero for lack of a rate.
pub fn render(service: &RateService, amount: Amount, currency: &str, mode: RateKind) -> String {
    let base = service.base_currency();
    let result = service.convert(amount, currency, mode);
    let mut out = format!(
        "{amount} {currency} = {}",
        ui::style_text(
            &format!("{}{result} {base}", ui::currency_sign(base)),
            StyleType::Value
        )
    );

    let view = service.get(mode);
    let note = match &view.data {
        None => Some(match &view.error {
            Some(error) => format!("No {mode} rates available: {error}"),
            None => format!("No {mode} rates available"),
        }),
        Some(rates) if currency != base && !rates.contains(currency) => {
            Some(format!("No {mode} rate for {currency}"))
        }
        Some(_) if view.is_stale => Some("Rates are stale".to_string()),
        Some(_) => None,
    };
    if let Some(note) = note {
        out.push('\n');
        out.push_str(&ui::style_text(&note, StyleType::Warning));
    }
    out
}
