//! Static last-resort prices used when a crypto source omits a symbol.

/// Approximate USD prices per coin. Only consulted for symbols a source did
/// not return at all.
pub const FALLBACK_USD_PRICES: &[(&str, f64)] = &[
    ("BTC", 45_000.0),
    ("ETH", 2_500.0),
    ("BNB", 300.0),
    ("USDC", 1.0),
    ("XRP", 0.5),
    ("ADA", 0.45),
    ("USDT", 1.0),
    ("SOL", 100.0),
];

pub fn fallback_usd_price(symbol: &str) -> Option<f64> {
    FALLBACK_USD_PRICES
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, price)| *price)
}
