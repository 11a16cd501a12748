//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the host of an endpoint URL, or the input unchanged if it does
/// not parse.
///
/// Usage in templates: `{{ endpoint|endpoint_host }}`
#[askama::filter_fn]
pub fn endpoint_host(endpoint: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let endpoint = endpoint.to_string();
    Ok(url::Url::parse(&endpoint)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
        .unwrap_or(endpoint))
}
