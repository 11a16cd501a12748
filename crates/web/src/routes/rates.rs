//! Exchange rate route handlers.

use std::convert::Infallible;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::error::Result;
use crate::graphql::queries::{GetExchangeRates, get_exchange_rates};
use crate::graphql::{FetchPolicy, QueryHandle, QueryState};
use crate::state::AppState;
use crate::views::{RatesFragmentTemplate, RatesPageTemplate, RatesView};

/// Rates query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RatesParams {
    /// Skip the cached response and fetch again.
    #[serde(default)]
    pub refresh: bool,
}

impl RatesParams {
    const fn policy(&self) -> FetchPolicy {
        if self.refresh {
            FetchPolicy::NetworkOnly
        } else {
            FetchPolicy::CacheFirst
        }
    }
}

async fn execute_rates(
    state: &AppState,
    params: &RatesParams,
) -> QueryHandle<get_exchange_rates::ResponseData> {
    state
        .client()
        .execute_with_policy::<GetExchangeRates>(
            get_exchange_rates::Variables::default(),
            params.policy(),
        )
        .await
}

/// Wait for the terminal state and log the outcome.
async fn settled_rates(
    state: &AppState,
    params: &RatesParams,
) -> QueryState<get_exchange_rates::ResponseData> {
    let settled = execute_rates(state, params).await.settled().await;

    if let Some(data) = settled.data() {
        debug!(payload = ?data, "Exchange rates received");
    } else if let Some(e) = settled.error() {
        error!(error = %e, "Failed to fetch exchange rates");
    }

    settled
}

/// GET /
///
/// Full page. The section is rendered in `loading` and replaced by the
/// events of `/rates/stream`; no query runs for the page itself.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<RatesParams>,
) -> impl IntoResponse {
    RatesPageTemplate {
        view: RatesView::loading(),
        endpoint: state.client().endpoint().to_string(),
        refresh: params.refresh,
    }
}

/// GET /rates
///
/// The rates section alone, for HTMX swaps. Query failures render the
/// error element; the status stays 200.
#[instrument(skip(state))]
pub async fn fragment(
    State(state): State<AppState>,
    Query(params): Query<RatesParams>,
) -> Result<impl IntoResponse> {
    let settled = settled_rates(&state, &params).await;

    let html = RatesFragmentTemplate {
        view: RatesView::from_state(&settled),
    }
    .render()?;

    Ok(axum::response::Html(html))
}

/// GET /rates/stream
///
/// One SSE event per state transition, named after the state, carrying the
/// rendered rates section, then a `close` event. Closing the connection
/// cancels the request.
#[instrument(skip(state))]
pub async fn stream(
    State(state): State<AppState>,
    Query(params): Query<RatesParams>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let handle = execute_rates(&state, &params).await;

    let events = handle
        .subscribe()
        .map(|state| Ok(render_event(&state)))
        .chain(futures::stream::once(std::future::ready(Ok(close_event()))));

    Sse::new(events).keep_alive(KeepAlive::default())
}

fn render_event(state: &QueryState<get_exchange_rates::ResponseData>) -> Event {
    if let Some(data) = state.data() {
        debug!(payload = ?data, "Exchange rates received");
    }

    let fragment = RatesFragmentTemplate {
        view: RatesView::from_state(state),
    };

    match fragment.render() {
        Ok(html) => Event::default().event(state.name()).data(html),
        Err(e) => {
            error!(error = %e, "Failed to render rates event");
            Event::default().event("failed").data("Internal server error")
        }
    }
}

/// Tells the page to stop listening; the stream ends after it.
fn close_event() -> Event {
    Event::default().event("close").data("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_selects_network_only() {
        assert_eq!(RatesParams::default().policy(), FetchPolicy::CacheFirst);
        assert_eq!(
            RatesParams { refresh: true }.policy(),
            FetchPolicy::NetworkOnly
        );
    }

    #[test]
    fn test_params_deserialize() {
        let params: RatesParams = serde_json::from_str(r#"{"refresh": true}"#).expect("parse");
        assert!(params.refresh);

        let params: RatesParams = serde_json::from_str("{}").expect("parse");
        assert!(!params.refresh);
    }
}
