//! Integration tests for the exchange rates viewer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p exchange-rates-integration-tests
//! ```
//!
//! The GraphQL endpoint is a `wiremock` server; no network access is needed.
//!
//! # Test Categories
//!
//! - `rates_client` - Client executions against the mock endpoint
//! - `rates_routes` - HTTP routes rendered through the router

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use exchange_rates_web::graphql::{GraphqlClient, build_client};
use exchange_rates_web::routes;
use exchange_rates_web::state::AppState;

/// A successful `GetExchangeRates` response body.
#[must_use]
pub fn rates_body(rates: &[(&str, Value, &str)]) -> Value {
    let rates: Vec<Value> = rates
        .iter()
        .map(|(currency, rate, name)| json!({"currency": currency, "rate": rate, "name": name}))
        .collect();
    json!({"data": {"rates": rates}})
}

/// The two-row response used by most tests.
#[must_use]
pub fn usd_eur_body() -> Value {
    rates_body(&[
        ("USD", json!(1), "US Dollar"),
        ("EUR", json!("0.9"), "Euro"),
    ])
}

/// Start a mock endpoint answering every POST with `response`.
pub async fn mock_endpoint(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

/// A client pointed at the mock server.
#[must_use]
pub fn client_for(server: &MockServer) -> GraphqlClient {
    build_client(&server.uri())
}

/// The application router backed by a client for `server`.
#[must_use]
pub fn app_for(server: &MockServer) -> axum::Router {
    routes::app(AppState::new(client_for(server)))
}
