//! Exchange rate view.

use askama::Template;
use askama_web::WebTemplate;
use exchange_rates_core::{RateRow, duplicate_currencies};
use tracing::warn;

use crate::filters;
use crate::graphql::QueryState;
use crate::graphql::conversions::convert_rates;
use crate::graphql::queries::get_exchange_rates::ResponseData;

/// What the rates section shows for one query state.
///
/// Exactly one mode applies: loading placeholder, error message, or rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesView {
    /// State name (`loading`, `failed`, `success`).
    pub state: &'static str,
    /// Show the loading placeholder.
    pub loading: bool,
    /// Show the error element.
    pub failed: bool,
    /// Error description when `failed`.
    pub error: String,
    /// Rows in response order when neither loading nor failed.
    pub rows: Vec<RateRow>,
}

impl RatesView {
    /// Project a query state into a view.
    ///
    /// `Idle` shows the loading placeholder. Rows with duplicate currency
    /// codes are all kept, in response order.
    #[must_use]
    pub fn from_state(state: &QueryState<ResponseData>) -> Self {
        match state {
            QueryState::Idle | QueryState::Loading => Self::loading(),
            QueryState::Failed(error) => Self::failed(error.to_string()),
            QueryState::Success(data) => {
                let rows = convert_rates(data);
                let duplicates = duplicate_currencies(&rows);
                if !duplicates.is_empty() {
                    warn!(currencies = ?duplicates, "Duplicate currency codes in rates response");
                }
                Self::rows(rows)
            }
        }
    }

    /// The loading placeholder.
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            state: "loading",
            loading: true,
            failed: false,
            error: String::new(),
            rows: Vec::new(),
        }
    }

    /// The error element.
    #[must_use]
    pub const fn failed(error: String) -> Self {
        Self {
            state: "failed",
            loading: false,
            failed: true,
            error,
            rows: Vec::new(),
        }
    }

    /// One row per rate.
    #[must_use]
    pub const fn rows(rows: Vec<RateRow>) -> Self {
        Self {
            state: "success",
            loading: false,
            failed: false,
            error: String::new(),
            rows,
        }
    }
}

/// Rates section alone (HTMX fragment, SSE payload).
#[derive(Template, WebTemplate)]
#[template(path = "partials/rates.html")]
pub struct RatesFragmentTemplate {
    pub view: RatesView,
}

/// Full rates page.
///
/// The section starts in `view` and is replaced by each event from
/// `/rates/stream`.
#[derive(Template, WebTemplate)]
#[template(path = "pages/rates.html")]
pub struct RatesPageTemplate {
    pub view: RatesView,
    /// Endpoint the rates come from, shown in the footer.
    pub endpoint: String,
    /// Connect the stream with `?refresh=true`.
    pub refresh: bool,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graphql::ClientError;
    use crate::graphql::queries::get_exchange_rates::Rate;

    fn success(rates: Vec<(&str, f64, &str)>) -> QueryState<ResponseData> {
        QueryState::Success(Arc::new(ResponseData {
            rates: Some(
                rates
                    .into_iter()
                    .map(|(currency, rate, name)| {
                        Some(Rate {
                            currency: currency.to_string(),
                            rate,
                            name: name.to_string(),
                        })
                    })
                    .collect(),
            ),
        }))
    }

    fn render(state: &QueryState<ResponseData>) -> String {
        RatesFragmentTemplate {
            view: RatesView::from_state(state),
        }
        .render()
        .expect("template renders")
    }

    #[test]
    fn test_loading_renders_placeholder_only() {
        let html = render(&QueryState::Loading);
        assert!(html.contains(r#"<div class="rates-loading">loading</div>"#));
        assert!(!html.contains("rates-error"));
        assert!(!html.contains(r#"class="rate""#));
    }

    #[test]
    fn test_idle_renders_as_loading() {
        assert_eq!(RatesView::from_state(&QueryState::Idle), RatesView::loading());
    }

    #[test]
    fn test_failed_renders_error_only() {
        let state = QueryState::Failed(Arc::new(ClientError::NoData));
        let html = render(&state);

        assert!(html.contains(r#"<div class="rates-error" role="alert">No data in response</div>"#));
        assert!(!html.contains("rates-loading"));
        assert!(!html.contains(r#"class="rate""#));
    }

    #[test]
    fn test_error_text_is_escaped() {
        let view = RatesView::failed("<script>".to_string());
        let html = RatesFragmentTemplate { view }.render().expect("renders");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_success_renders_rows_in_order() {
        let state = success(vec![("USD", 1.0, "US Dollar"), ("EUR", 0.9, "Euro")]);
        let html = render(&state);

        assert_eq!(html.matches(r#"class="rate""#).count(), 2);
        let usd = html.find("<span>USD: 1</span>").expect("USD row");
        let eur = html.find("<span>EUR: 0.9</span>").expect("EUR row");
        assert!(usd < eur);
        assert!(html.contains("<span>US Dollar</span>"));
        assert!(html.contains("<span>Euro</span>"));
        assert!(!html.contains("rates-loading"));
    }

    #[test]
    fn test_success_rows_display() {
        let state = success(vec![("USD", 1.0, "US Dollar"), ("EUR", 0.9, "Euro")]);
        let view = RatesView::from_state(&state);

        let labels: Vec<_> = view.rows.iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["USD: 1 / US Dollar", "EUR: 0.9 / Euro"]);
    }

    #[test]
    fn test_empty_rates_render_no_rows() {
        let html = render(&success(vec![]));

        assert!(!html.contains(r#"class="rate""#));
        assert!(!html.contains("rates-loading"));
        assert!(!html.contains("rates-error"));
        assert_eq!(RatesView::from_state(&success(vec![])).state, "success");
    }

    #[test]
    fn test_page_wraps_section_and_shows_endpoint_host() {
        let page = RatesPageTemplate {
            view: RatesView::loading(),
            endpoint: "https://48p1r2roz4.sse.codesandbox.io".to_string(),
            refresh: false,
        };
        let html = page.render().expect("page renders");

        assert!(html.contains(r#"<section id="rates" data-state="loading">"#));
        assert!(html.contains("rates-loading"));
        assert!(html.contains(r#"hx-ext="sse""#));
        assert!(html.contains(r#"sse-swap="loading,success,failed""#));
        assert!(!html.contains("stream?refresh=true\""));
        assert!(html.contains("Rates from 48p1r2roz4.sse.codesandbox.io"));
    }

    #[test]
    fn test_page_refresh_connects_stream_with_refresh() {
        let page = RatesPageTemplate {
            view: RatesView::loading(),
            endpoint: "http://localhost:4000".to_string(),
            refresh: true,
        };
        let html = page.render().expect("page renders");

        assert!(html.contains("stream?refresh=true\""));
    }

    #[test]
    fn test_fragment_carries_state_on_section() {
        let html = render(&success(vec![("USD", 1.0, "US Dollar")]));

        assert!(html.trim_start().starts_with(r#"<section id="rates" data-state="success">"#));
        assert!(html.trim_end().ends_with("</section>"));
    }

    #[test]
    fn test_duplicate_currencies_are_all_rendered() {
        let state = success(vec![
            ("USD", 1.0, "US Dollar"),
            ("USD", 1.01, "US Dollar (alt)"),
        ]);
        let html = render(&state);

        assert_eq!(html.matches(r#"data-currency="USD""#).count(), 2);
        let first = html.find("<span>USD: 1</span>").expect("first row");
        let second = html.find("<span>USD: 1.01</span>").expect("second row");
        assert!(first < second);
    }
}
