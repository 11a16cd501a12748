//! Transport chain.
//!
//! An operation travels through an ordered list of [`Link`] stages. Each
//! stage may rewrite the operation and pass it on via [`Forward`], or answer
//! it directly. [`HttpLink`] terminates the chain by sending the operation
//! to the endpoint.

use std::sync::Arc;

use futures::future::BoxFuture;
use graphql_client::{QueryBody, Response};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::cache::QuerySignature;
use super::{ClientError, GraphQLError};

/// Result of running an operation: the response's `data` payload.
pub type LinkResult = Result<Value, ClientError>;

/// Maximum number of body characters kept in errors and logs.
const BODY_PREVIEW_CHARS: usize = 200;

/// A GraphQL operation on its way to the endpoint.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Operation name (e.g., "GetExchangeRates").
    pub operation_name: &'static str,
    /// Query document text.
    pub query: &'static str,
    /// Resolved variables.
    pub variables: Value,
    /// Extra request headers set by links.
    pub headers: HeaderMap,
}

impl Operation {
    /// Create an operation from a `graphql_client` query body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Variables` if the variables cannot be
    /// serialized to JSON.
    pub fn from_body<V: Serialize>(body: &QueryBody<V>) -> Result<Self, ClientError> {
        let variables = serde_json::to_value(&body.variables).map_err(ClientError::Variables)?;

        Ok(Self {
            operation_name: body.operation_name,
            query: body.query,
            variables,
            headers: HeaderMap::new(),
        })
    }

    /// The cache identity of this operation.
    #[must_use]
    pub fn signature(&self) -> QuerySignature {
        QuerySignature::new(self.operation_name, self.query, &self.variables)
    }
}

/// One stage of the transport chain.
pub trait Link: Send + Sync {
    /// Handle an operation, either answering it or passing it to `forward`.
    fn request<'a>(&'a self, operation: Operation, forward: Forward<'a>)
    -> BoxFuture<'a, LinkResult>;
}

/// The remainder of the chain after the current stage.
pub struct Forward<'a> {
    rest: &'a [Arc<dyn Link>],
}

impl<'a> Forward<'a> {
    /// Pass the operation to the next stage.
    pub fn run(self, operation: Operation) -> BoxFuture<'a, LinkResult> {
        match self.rest.split_first() {
            Some((link, rest)) => link.request(operation, Forward { rest }),
            None => Box::pin(async { Err(ClientError::UnterminatedChain) }),
        }
    }
}

/// An ordered list of stages.
#[derive(Clone)]
pub struct LinkChain {
    links: Arc<[Arc<dyn Link>]>,
}

impl LinkChain {
    /// Create a chain from stages in request order.
    #[must_use]
    pub fn new(links: Vec<Arc<dyn Link>>) -> Self {
        Self {
            links: links.into(),
        }
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Run an operation through the chain.
    pub fn execute(&self, operation: Operation) -> BoxFuture<'_, LinkResult> {
        Forward { rest: &self.links }.run(operation)
    }
}

// =============================================================================
// HttpLink
// =============================================================================

/// Terminating stage: POSTs the operation as JSON to the endpoint.
#[derive(Debug, Clone)]
pub struct HttpLink {
    http: reqwest::Client,
    endpoint: String,
}

/// Request body sent to the endpoint.
#[derive(Serialize)]
struct RequestBody<'a> {
    query: &'a str,
    variables: &'a Value,
    #[serde(rename = "operationName")]
    operation_name: &'a str,
}

impl HttpLink {
    /// Create a stage bound to `endpoint`.
    ///
    /// The URL is not validated here; a malformed URL fails each request.
    #[must_use]
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    #[instrument(skip_all, fields(operation = operation.operation_name, endpoint = %self.endpoint))]
    async fn send(&self, operation: Operation) -> LinkResult {
        let body = RequestBody {
            query: operation.query,
            variables: &operation.variables,
            operation_name: operation.operation_name,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .headers(operation.headers.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %preview(&response_text),
                "GraphQL endpoint returned non-success status"
            );
            return Err(ClientError::Status {
                status,
                body: preview(&response_text),
            });
        }

        let response: Response<Value> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %preview(&response_text),
                    "Failed to parse GraphQL response"
                );
                return Err(ClientError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ClientError::GraphQL(
                errors.into_iter().map(GraphQLError::from).collect(),
            ));
        }

        match response.data {
            Some(data) if !data.is_null() => Ok(data),
            _ => {
                tracing::error!(
                    body = %preview(&response_text),
                    "GraphQL response has no data and no errors"
                );
                Err(ClientError::NoData)
            }
        }
    }
}

impl Link for HttpLink {
    fn request<'a>(
        &'a self,
        operation: Operation,
        _forward: Forward<'a>,
    ) -> BoxFuture<'a, LinkResult> {
        Box::pin(self.send(operation))
    }
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

// =============================================================================
// HeaderLink
// =============================================================================

/// Adds fixed headers to every operation, then forwards it.
#[derive(Debug, Clone, Default)]
pub struct HeaderLink {
    headers: HeaderMap,
}

impl HeaderLink {
    /// Create a stage that adds `headers`.
    #[must_use]
    pub const fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// Create a stage that sends `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token contains characters not allowed in a
    /// header value.
    pub fn bearer(token: &SecretString) -> Result<Self, InvalidHeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(Self { headers })
    }
}

impl Link for HeaderLink {
    fn request<'a>(
        &'a self,
        mut operation: Operation,
        forward: Forward<'a>,
    ) -> BoxFuture<'a, LinkResult> {
        for (name, value) in &self.headers {
            operation.headers.insert(name.clone(), value.clone());
        }
        forward.run(operation)
    }
}
