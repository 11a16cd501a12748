//! Application state shared across handlers.

use std::sync::Arc;

use crate::graphql::GraphqlClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; every request sees the same client and
/// therefore the same response cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    client: GraphqlClient,
}

impl AppState {
    /// Create a new application state around a configured client.
    #[must_use]
    pub fn new(client: GraphqlClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner { client }),
        }
    }

    /// Get a reference to the GraphQL client.
    #[must_use]
    pub fn client(&self) -> &GraphqlClient {
        &self.inner.client
    }
}
