//! In-memory response cache.
//!
//! Stores the `data` payload of successful operations, keyed by
//! [`QuerySignature`]. There is no normalization beyond the signature: two
//! operations share an entry only when name, text and variables all match.

use std::fmt::Write as _;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

/// Default number of cached payloads.
pub const DEFAULT_CAPACITY: u64 = 1000;

/// Deterministic identity of an operation invocation.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct QuerySignature(String);

impl QuerySignature {
    /// Build a signature from an operation's name, text and variables.
    ///
    /// Variables are rendered as canonical JSON, so key order never affects
    /// the result.
    #[must_use]
    pub fn new(operation_name: &str, query: &str, variables: &Value) -> Self {
        let mut key = String::with_capacity(operation_name.len() + query.len() + 16);
        key.push_str(operation_name);
        key.push('\n');
        key.push_str(query.trim());
        key.push('\n');
        write_canonical(&mut key, variables);
        Self(key)
    }

    /// Returns the signature as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn write_canonical(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Keys are JSON strings; Value's Display does the escaping.
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(out, value);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(out, item);
            }
            out.push(']');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}

/// Cache of successful response payloads.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<QuerySignature, Value>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` payloads.
    ///
    /// With `ttl` unset, entries live until evicted for capacity or the
    /// cache is reset.
    #[must_use]
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            entries: builder.build(),
        }
    }

    /// Look up the payload stored for a signature.
    pub async fn get(&self, signature: &QuerySignature) -> Option<Value> {
        self.entries.get(signature).await
    }

    /// Store a payload, replacing any previous one for the same signature.
    pub async fn insert(&self, signature: QuerySignature, data: Value) {
        self.entries.insert(signature, data).await;
    }

    /// Drop every cached payload.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const QUERY: &str = "query Rates($currency: String!) { rates(currency: $currency) { rate } }";

    #[test]
    fn test_signature_is_stable() {
        let vars = json!({"currency": "USD"});
        let a = QuerySignature::new("Rates", QUERY, &vars);
        let b = QuerySignature::new("Rates", QUERY, &vars);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_ignores_key_order() {
        let a = QuerySignature::new(
            "Rates",
            QUERY,
            &json!({"currency": "USD", "filter": {"min": 1, "max": 2}}),
        );
        let b = QuerySignature::new(
            "Rates",
            QUERY,
            &json!({"filter": {"max": 2, "min": 1}, "currency": "USD"}),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_differs_by_variables() {
        let usd = QuerySignature::new("Rates", QUERY, &json!({"currency": "USD"}));
        let eur = QuerySignature::new("Rates", QUERY, &json!({"currency": "EUR"}));
        assert_ne!(usd, eur);
    }

    #[test]
    fn test_signature_differs_by_text() {
        let vars = json!({});
        let a = QuerySignature::new("Rates", "query Rates { rates { rate } }", &vars);
        let b = QuerySignature::new("Rates", "query Rates { rates { name } }", &vars);
        assert_ne!(a, b);
    }

    #[test]
    fn test_signature_escapes_keys() {
        let a = QuerySignature::new("Q", QUERY, &json!({"a\"b": 1}));
        assert!(a.as_str().ends_with(r#"{"a\"b":1}"#));
    }

    #[tokio::test]
    async fn test_insert_overwrites_slot() {
        let cache = ResponseCache::default();
        let key = QuerySignature::new("Rates", QUERY, &json!({"currency": "USD"}));

        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), json!({"rates": []})).await;
        cache.insert(key.clone(), json!({"rates": [{"rate": 1}]})).await;

        assert_eq!(cache.get(&key).await, Some(json!({"rates": [{"rate": 1}]})));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResponseCache::default();
        let key = QuerySignature::new("Rates", QUERY, &json!({}));
        cache.insert(key.clone(), json!({"rates": []})).await;

        cache.clear();

        assert!(cache.get(&key).await.is_none());
    }
}
