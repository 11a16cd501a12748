//! GraphQL client for the exchange rates endpoint.
//!
//! # Architecture
//!
//! - Operations implement `graphql_client::GraphQLQuery`
//! - Requests pass through an ordered chain of [`Link`] stages; the last one
//!   ([`HttpLink`]) POSTs the operation with `reqwest`
//! - Successful payloads are cached in memory via `moka`, keyed by the
//!   operation's [`QuerySignature`]
//! - Each execution is observed through a [`QueryHandle`], which moves from
//!   `Loading` to exactly one of `Success` / `Failed`
//!
//! # Example
//!
//! ```rust,ignore
//! use exchange_rates_web::graphql::{build_client, queries::{GetExchangeRates, get_exchange_rates}};
//!
//! let client = build_client("https://48p1r2roz4.sse.codesandbox.io");
//!
//! let handle = client
//!     .execute::<GetExchangeRates>(get_exchange_rates::Variables::default())
//!     .await;
//! let state = handle.settled().await;
//! ```

mod cache;
mod client;
pub mod conversions;
mod handle;
mod link;
pub mod queries;

pub use cache::{DEFAULT_CAPACITY, QuerySignature, ResponseCache};
pub use client::{ClientBuilder, FetchPolicy, GraphqlClient, build_client};
pub use handle::{QueryHandle, QueryState};
pub use link::{Forward, HeaderLink, HttpLink, Link, LinkChain, LinkResult, Operation};

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while executing a GraphQL operation.
///
/// Every variant ends the execution in the `Failed` state; callers render
/// the `Display` output and do not branch on the kind.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connection refused, DNS, TLS, timeout, bad URL).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response JSON did not match the operation's expected shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[source] serde_json::Error),

    /// The operation's variables could not be serialized.
    #[error("Invalid variables: {0}")]
    Variables(#[source] serde_json::Error),

    /// The response carried a GraphQL `errors` array.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// The response had neither `data` nor `errors`.
    #[error("No data in response")]
    NoData,

    /// Every link forwarded the operation and none sent it.
    #[error("Link chain has no terminating link")]
    UnterminatedChain,

    /// The request task ended before producing a result.
    #[error("Query was interrupted before completing")]
    Interrupted,
}

/// A GraphQL error returned by the endpoint.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(error: graphql_client::Error) -> Self {
        Self {
            message: error.message,
            locations: error.locations.map_or_else(Vec::new, |locs| {
                locs.into_iter()
                    .map(|l| GraphQLErrorLocation {
                        line: i64::from(l.line),
                        column: i64::from(l.column),
                    })
                    .collect()
            }),
            path: error.path.map_or_else(Vec::new, |p| {
                p.into_iter()
                    .map(|fragment| match fragment {
                        graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                        graphql_client::PathFragment::Index(i) => {
                            serde_json::Value::Number(i.into())
                        }
                    })
                    .collect()
            }),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
