//! Exchange rate display rows.

use core::fmt;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One exchange rate, projected for display.
///
/// Rows are derived from a query response and never persisted. The
/// `currency` code is the row's key when rendered.
///
/// ## Examples
///
/// ```
/// use exchange_rates_core::RateRow;
///
/// let row = RateRow::new("EUR", 0.9, "Euro");
/// assert_eq!(row.to_string(), "EUR: 0.9 / Euro");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRow {
    /// Currency code (e.g., "EUR").
    pub currency: String,
    /// Units of this currency per unit of the base currency.
    pub rate: f64,
    /// Human-readable currency name (e.g., "Euro").
    pub name: String,
}

impl RateRow {
    /// Create a new row.
    #[must_use]
    pub fn new(currency: impl Into<String>, rate: f64, name: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            rate,
            name: name.into(),
        }
    }
}

impl fmt::Display for RateRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} / {}", self.currency, self.rate, self.name)
    }
}

/// Returns the currency codes that appear more than once, in order of their
/// second appearance.
///
/// Upstream responses are not guaranteed to have unique codes.
#[must_use]
pub fn duplicate_currencies(rows: &[RateRow]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    rows.iter()
        .filter_map(|row| {
            let code = row.currency.as_str();
            (!seen.insert(code) && reported.insert(code)).then_some(code)
        })
        .collect()
}
