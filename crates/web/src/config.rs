//! Exchange rates viewer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `EXCHANGE_RATES_HOST` - Bind address (default: 127.0.0.1)
//! - `EXCHANGE_RATES_PORT` - Listen port (default: 3000)
//! - `EXCHANGE_RATES_GRAPHQL_ENDPOINT` - GraphQL endpoint URL
//!   (default: <https://48p1r2roz4.sse.codesandbox.io>)
//! - `EXCHANGE_RATES_API_TOKEN` - Bearer token sent with every request
//! - `EXCHANGE_RATES_CACHE_CAPACITY` - Maximum cached responses (default: 1000)
//! - `EXCHANGE_RATES_CACHE_TTL_SECS` - Cached response lifetime (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::graphql::{ClientBuilder, GraphqlClient, HeaderLink};

/// Public sandbox serving the exchange rates schema.
pub const DEFAULT_ENDPOINT: &str = "https://48p1r2roz4.sse.codesandbox.io";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// GraphQL client configuration
    pub graphql: GraphqlConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., production, staging)
    pub sentry_environment: Option<String>,
}

/// GraphQL client configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct GraphqlConfig {
    /// Endpoint URL, passed to the client verbatim
    pub endpoint: String,
    /// Optional bearer token
    pub api_token: Option<SecretString>,
    /// Maximum number of cached responses
    pub cache_capacity: u64,
    /// How long a cached response stays valid; `None` keeps it until evicted
    pub cache_ttl: Option<Duration>,
}

impl std::fmt::Debug for GraphqlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphqlConfig")
            .field("endpoint", &self.endpoint)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

impl Default for GraphqlConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_token: None,
            cache_capacity: crate::graphql::DEFAULT_CAPACITY,
            cache_ttl: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = parse_or_default(&lookup, "EXCHANGE_RATES_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or_default(&lookup, "EXCHANGE_RATES_PORT", 3000_u16)?;
        let graphql = GraphqlConfig::from_lookup(&lookup)?;

        Ok(Self {
            host,
            port,
            graphql,
            sentry_dsn: get_optional(&lookup, "SENTRY_DSN"),
            sentry_environment: get_optional(&lookup, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GraphqlConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let endpoint = get_optional(lookup, "EXCHANGE_RATES_GRAPHQL_ENDPOINT")
            .unwrap_or(defaults.endpoint);

        let api_token = get_optional(lookup, "EXCHANGE_RATES_API_TOKEN")
            .map(|token| validate_token(token, "EXCHANGE_RATES_API_TOKEN"))
            .transpose()?;

        let cache_capacity =
            parse_or_default(lookup, "EXCHANGE_RATES_CACHE_CAPACITY", defaults.cache_capacity)?;

        let cache_ttl = get_optional(lookup, "EXCHANGE_RATES_CACHE_TTL_SECS")
            .map(|raw| parse_value::<u64>(&raw, "EXCHANGE_RATES_CACHE_TTL_SECS"))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            endpoint,
            api_token,
            cache_capacity,
            cache_ttl,
        })
    }

    /// Whether the endpoint parses as an absolute URL.
    ///
    /// A malformed endpoint is still handed to the client; requests against
    /// it fail at execution time.
    #[must_use]
    pub fn endpoint_is_valid(&self) -> bool {
        url::Url::parse(&self.endpoint).is_ok()
    }

    /// Build a GraphQL client from this configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the token cannot be sent as a
    /// header value.
    pub fn build_client(&self) -> Result<GraphqlClient, ConfigError> {
        let mut builder =
            ClientBuilder::new(self.endpoint.clone()).with_cache_capacity(self.cache_capacity);

        if let Some(ttl) = self.cache_ttl {
            builder = builder.with_cache_ttl(ttl);
        }

        if let Some(token) = &self.api_token {
            let auth = HeaderLink::bearer(token).map_err(|e| {
                ConfigError::InvalidEnvVar("EXCHANGE_RATES_API_TOKEN".to_string(), e.to_string())
            })?;
            builder = builder.with_link(auth);
        }

        Ok(builder.build())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional variable, treating empty values as unset.
fn get_optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Parse a variable, falling back to `default` when unset.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional(lookup, key).map_or(Ok(default), |raw| parse_value(&raw, key))
}

fn parse_value<T>(raw: &str, key: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Check that a token can be sent in an `Authorization` header.
fn validate_token(token: String, key: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(token);
    HeaderValue::from_str(&format!("Bearer {}", secret.expose_secret())).map_err(|_| {
        ConfigError::InvalidEnvVar(key.to_string(), "not a valid header value".to_string())
    })?;
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).expect("defaults load");

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.graphql.endpoint, DEFAULT_ENDPOINT);
        assert!(config.graphql.api_token.is_none());
        assert_eq!(config.graphql.cache_capacity, 1000);
        assert!(config.graphql.cache_ttl.is_none());
        assert!(config.sentry_dsn.is_none());
        assert!(config.sentry_environment.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("EXCHANGE_RATES_HOST", "0.0.0.0"),
            ("EXCHANGE_RATES_PORT", "8080"),
            ("EXCHANGE_RATES_GRAPHQL_ENDPOINT", "http://localhost:4000/graphql"),
            ("EXCHANGE_RATES_CACHE_CAPACITY", "10"),
            ("EXCHANGE_RATES_CACHE_TTL_SECS", "60"),
            ("SENTRY_ENVIRONMENT", "staging"),
        ])
        .expect("config loads");

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.graphql.endpoint, "http://localhost:4000/graphql");
        assert_eq!(config.graphql.cache_capacity, 10);
        assert_eq!(config.graphql.cache_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = load(&[("EXCHANGE_RATES_PORT", "")]).expect("config loads");
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("EXCHANGE_RATES_PORT", "not-a-port")]).expect_err("invalid port");
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EXCHANGE_RATES_PORT"));
    }

    #[test]
    fn test_invalid_host() {
        let err = load(&[("EXCHANGE_RATES_HOST", "localhost")]).expect_err("invalid host");
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EXCHANGE_RATES_HOST"));
    }

    #[test]
    fn test_invalid_ttl() {
        let err = load(&[("EXCHANGE_RATES_CACHE_TTL_SECS", "-5")]).expect_err("invalid ttl");
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_token_with_newline_rejected() {
        let err = load(&[("EXCHANGE_RATES_API_TOKEN", "abc\ndef")]).expect_err("invalid token");
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "EXCHANGE_RATES_API_TOKEN")
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[("EXCHANGE_RATES_API_TOKEN", "s3cr3t-t0ken")]).expect("config loads");
        let debug = format!("{:?}", config.graphql);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("s3cr3t-t0ken"));
    }

    #[test]
    fn test_malformed_endpoint_is_accepted() {
        let config =
            load(&[("EXCHANGE_RATES_GRAPHQL_ENDPOINT", "not a url")]).expect("config loads");

        assert!(!config.graphql.endpoint_is_valid());
        let client = config.graphql.build_client().expect("client builds");
        assert_eq!(client.endpoint(), "not a url");
    }

    #[test]
    fn test_build_client_with_token() {
        let config = load(&[("EXCHANGE_RATES_API_TOKEN", "abc123")]).expect("config loads");
        assert!(config.graphql.endpoint_is_valid());
        assert!(config.graphql.build_client().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidEnvVar("EXCHANGE_RATES_PORT".to_string(), "bad".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid environment variable EXCHANGE_RATES_PORT: bad"
        );
    }
}
