//! Canonical rate types shared by sources, the pipeline and the cache

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// The two families of data the dashboard tracks.
///
/// The same value doubles as the conversion mode: fiat maps are read as
/// divisors, crypto maps as multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum RateKind {
    Fiat,
    Crypto,
}

impl RateKind {
    pub const ALL: [RateKind; 2] = [RateKind::Fiat, RateKind::Crypto];
}

impl Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RateKind::Fiat => "fiat",
                RateKind::Crypto => "crypto",
            }
        )
    }
}

impl FromStr for RateKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fiat" => Ok(RateKind::Fiat),
            "crypto" => Ok(RateKind::Crypto),
            _ => Err(anyhow::anyhow!("Invalid rate kind: {}", s)),
        }
    }
}

/// Raw quotes as reported by one upstream source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Quotes {
    /// `1 unit of the provider's base = rate units of code`
    Fiat(HashMap<String, f64>),
    /// `1 coin = price USD`. A coin the provider listed without a usable
    /// price maps to `f64::NAN`; coins it omitted are absent.
    UsdPrices(HashMap<String, f64>),
}

/// Checks the shape of a currency or coin code: uppercase ASCII alphanumerics,
/// 3 to 5 characters long.
pub fn is_valid_code(code: &str) -> bool {
    (3..=5).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// An immutable mapping from code to a positive rate, relative to `base`.
///
/// The base always maps to exactly `1.0` and every other entry is finite and
/// strictly positive. Entries violating this are refused at construction.
/// This holds for crypto maps too: one unit of base is worth one unit of base
/// under either convention.
#[derive(Debug, Clone, PartialEq)]
pub struct RateMap {
    base: String,
    rates: BTreeMap<String, f64>,
}

impl RateMap {
    /// Builds a map, discarding invalid entries. Returns the map together with
    /// the codes that were rejected.
    pub fn from_entries<I>(base: &str, entries: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut rejected = Vec::new();
        let mut rates = BTreeMap::new();
        for (code, rate) in entries {
            if code == base {
                continue;
            }
            if !is_valid_code(&code) || !rate.is_finite() || rate <= 0.0 {
                rejected.push(code);
                continue;
            }
            rates.insert(code, rate);
        }
        rates.insert(base.to_string(), 1.0);

        (
            Self {
                base: base.to_string(),
                rates,
            },
            rejected,
        )
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
