//! GraphQL client: transport chain plus response cache.

use std::sync::Arc;
use std::time::Duration;

use graphql_client::GraphQLQuery;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::ClientError;
use super::cache::{DEFAULT_CAPACITY, ResponseCache};
use super::handle::QueryHandle;
use super::link::{HttpLink, Link, LinkChain, Operation};

/// How an execution uses the response cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Serve a cached payload if present; otherwise fetch and store.
    #[default]
    CacheFirst,
    /// Always fetch; store the result, replacing any cached payload.
    NetworkOnly,
    /// Always fetch; never read or write the cache.
    NoCache,
}

impl FetchPolicy {
    const fn reads_cache(self) -> bool {
        matches!(self, Self::CacheFirst)
    }

    const fn writes_cache(self) -> bool {
        matches!(self, Self::CacheFirst | Self::NetworkOnly)
    }
}

/// Build a client with a single HTTP stage bound to `endpoint` and an empty
/// in-memory cache.
///
/// Never fails and performs no I/O; an unreachable or malformed endpoint
/// surfaces as a failed query.
#[must_use]
pub fn build_client(endpoint: &str) -> GraphqlClient {
    ClientBuilder::new(endpoint).build()
}

/// Builder for [`GraphqlClient`].
pub struct ClientBuilder {
    endpoint: String,
    http: Option<reqwest::Client>,
    links: Vec<Arc<dyn Link>>,
    cache_capacity: u64,
    cache_ttl: Option<Duration>,
}

impl ClientBuilder {
    /// Start a builder for `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: None,
            links: Vec::new(),
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: None,
        }
    }

    /// Add a stage before the HTTP stage. Stages run in the order added.
    #[must_use]
    pub fn with_link(mut self, link: impl Link + 'static) -> Self {
        self.links.push(Arc::new(link));
        self
    }

    /// Use a preconfigured `reqwest` client for the HTTP stage.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Maximum number of cached payloads.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Expire cached payloads after `ttl`.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> GraphqlClient {
        let http = self.http.unwrap_or_default();
        let mut links = self.links;
        links.push(Arc::new(HttpLink::new(http, self.endpoint.clone())));

        GraphqlClient {
            inner: Arc::new(GraphqlClientInner {
                endpoint: self.endpoint,
                chain: LinkChain::new(links),
                cache: ResponseCache::new(self.cache_capacity, self.cache_ttl),
            }),
        }
    }
}

/// Client for a GraphQL endpoint.
///
/// Cheap to clone; clones share the transport chain and the cache. Build
/// one per process and pass it to every consumer.
#[derive(Clone)]
pub struct GraphqlClient {
    inner: Arc<GraphqlClientInner>,
}

struct GraphqlClientInner {
    endpoint: String,
    chain: LinkChain,
    cache: ResponseCache,
}

impl std::fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.inner.endpoint)
            .field("links", &self.inner.chain.len())
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl GraphqlClient {
    /// The endpoint URL the HTTP stage sends to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a query with [`FetchPolicy::CacheFirst`].
    pub async fn execute<Q>(&self, variables: Q::Variables) -> QueryHandle<Q::ResponseData>
    where
        Q: GraphQLQuery,
        Q::Variables: Serialize,
        Q::ResponseData: DeserializeOwned + Send + Sync + 'static,
    {
        self.execute_with_policy::<Q>(variables, FetchPolicy::CacheFirst)
            .await
    }

    /// Execute a query.
    ///
    /// Returns immediately after the cache lookup: on a hit the handle is
    /// already in `Success`, otherwise it is in `Loading` and settles when
    /// the request completes in the background.
    #[instrument(skip_all, fields(policy = ?policy))]
    pub async fn execute_with_policy<Q>(
        &self,
        variables: Q::Variables,
        policy: FetchPolicy,
    ) -> QueryHandle<Q::ResponseData>
    where
        Q: GraphQLQuery,
        Q::Variables: Serialize,
        Q::ResponseData: DeserializeOwned + Send + Sync + 'static,
    {
        let operation = match Operation::from_body(&Q::build_query(variables)) {
            Ok(operation) => operation,
            Err(e) => return QueryHandle::spawn(async move { Err(e) }),
        };

        if policy.reads_cache()
            && let Some(data) = self.cached(&operation).await
        {
            return QueryHandle::ready(Ok(data));
        }

        let inner = Arc::clone(&self.inner);
        QueryHandle::spawn(fetch(inner, operation, policy))
    }

    /// Execute a query with [`FetchPolicy::CacheFirst`] and wait for the
    /// result, without creating a handle.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the execution.
    #[instrument(skip_all)]
    pub async fn query<Q>(&self, variables: Q::Variables) -> Result<Q::ResponseData, ClientError>
    where
        Q: GraphQLQuery,
        Q::Variables: Serialize,
        Q::ResponseData: DeserializeOwned,
    {
        let operation = Operation::from_body(&Q::build_query(variables))?;

        if let Some(data) = self.cached(&operation).await {
            return Ok(data);
        }

        fetch(Arc::clone(&self.inner), operation, FetchPolicy::CacheFirst).await
    }

    /// Decoded cached payload for an operation, if any.
    async fn cached<T: DeserializeOwned>(&self, operation: &Operation) -> Option<T> {
        let cached = self.inner.cache.get(&operation.signature()).await?;

        match serde_json::from_value(cached) {
            Ok(data) => {
                debug!(operation = operation.operation_name, "Cache hit");
                Some(data)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Drop every cached payload.
    pub fn reset_cache(&self) {
        self.inner.cache.clear();
    }
}

/// Send an operation through the chain, decode the payload and store it
/// according to `policy`.
///
/// Only payloads that decode are stored.
async fn fetch<T: DeserializeOwned>(
    inner: Arc<GraphqlClientInner>,
    operation: Operation,
    policy: FetchPolicy,
) -> Result<T, ClientError> {
    let signature = operation.signature();
    let data = inner.chain.execute(operation).await?;
    let decoded = serde_json::from_value(data.clone()).map_err(ClientError::Decode)?;

    if policy.writes_cache() {
        inner.cache.insert(signature, data).await;
    }

    Ok(decoded)
}
