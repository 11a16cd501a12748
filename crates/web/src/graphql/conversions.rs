//! Conversions from GraphQL response types to display rows.

use exchange_rates_core::RateRow;

use super::queries::get_exchange_rates;

/// Project a `GetExchangeRates` response into rows, keeping input order.
///
/// A `null` rates list yields no rows; `null` entries are skipped.
#[must_use]
pub fn convert_rates(data: &get_exchange_rates::ResponseData) -> Vec<RateRow> {
    data.rates
        .iter()
        .flatten()
        .flatten()
        .map(|rate| RateRow::new(rate.currency.clone(), rate.rate, rate.name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use get_exchange_rates::{Rate, ResponseData};

    fn rate(currency: &str, value: f64, name: &str) -> Option<Rate> {
        Some(Rate {
            currency: currency.to_string(),
            rate: value,
            name: name.to_string(),
        })
    }

    #[test]
    fn test_convert_keeps_order() {
        let data = ResponseData {
            rates: Some(vec![rate("USD", 1.0, "US Dollar"), rate("EUR", 0.9, "Euro")]),
        };

        let rows = convert_rates(&data);

        let labels: Vec<_> = rows.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["USD: 1 / US Dollar", "EUR: 0.9 / Euro"]);
    }

    #[test]
    fn test_convert_empty() {
        let data = ResponseData {
            rates: Some(vec![]),
        };
        assert!(convert_rates(&data).is_empty());
    }

    #[test]
    fn test_convert_null_list() {
        let data = ResponseData { rates: None };
        assert!(convert_rates(&data).is_empty());
    }

    #[test]
    fn test_convert_skips_null_entries() {
        let data = ResponseData {
            rates: Some(vec![None, rate("JPY", 149.5, "Japanese Yen"), None]),
        };

        let rows = convert_rates(&data);
        assert_eq!(rows, vec![RateRow::new("JPY", 149.5, "Japanese Yen")]);
    }
}
