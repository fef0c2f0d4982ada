//! Client construction options with sensible defaults.
//!
//! [`ClientOptions`] can be built in code with the `with_*` methods or
//! deserialized from the JSON options object (`cacheExpire`, `debug`,
//! `headers`, `transportFailure`, `unescapeEntities`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL;
use crate::Headers;

/// What an operation call returns when the transport produces no response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportFailurePolicy {
    /// Resolve with a `Failure` envelope whose status is `0`.
    #[default]
    Resolve,
    /// Return `Err(DispatchError::Transport)`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientOptions {
    /// GET cache TTL in milliseconds. Default: `20000`.
    pub cache_expire: u64,
    /// Log every composed request at info level. Default: `false`.
    pub debug: bool,
    /// Headers added to every request, over the JSON baseline.
    pub headers: Headers,
    /// Default: [`TransportFailurePolicy::Resolve`].
    pub transport_failure: TransportFailurePolicy,
    /// Decode HTML entities in parsed response strings. Default: `false`.
    pub unescape_entities: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            cache_expire: millis(DEFAULT_TTL),
            debug: false,
            headers: Headers::new(),
            transport_failure: TransportFailurePolicy::default(),
            unescape_entities: false,
        }
    }
}

impl ClientOptions {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_expire)
    }

    pub fn with_cache_expire(mut self, ttl: Duration) -> Self {
        self.cache_expire = millis(ttl);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_transport_failure(mut self, policy: TransportFailurePolicy) -> Self {
        self.transport_failure = policy;
        self
    }

    pub fn with_unescape_entities(mut self, unescape: bool) -> Self {
        self.unescape_entities = unescape;
        self
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = ClientOptions::default();
        assert_eq!(options.cache_expire, 20_000);
        assert_eq!(options.cache_ttl(), Duration::from_secs(20));
        assert!(!options.debug);
        assert!(options.headers.is_empty());
        assert_eq!(options.transport_failure, TransportFailurePolicy::Resolve);
        assert!(!options.unescape_entities);
    }

    #[test]
    fn deserializes_partial_options_object() {
        let options: ClientOptions = serde_json::from_str(
            r#"{"cacheExpire": 500, "headers": {"x-api-key": "k"}, "transportFailure": "reject"}"#,
        )
        .unwrap();
        assert_eq!(options.cache_ttl(), Duration::from_millis(500));
        assert_eq!(options.headers.get("x-api-key").map(String::as_str), Some("k"));
        assert_eq!(options.transport_failure, TransportFailurePolicy::Reject);
        assert!(!options.debug);
    }

    #[test]
    fn builder_methods_override_defaults() {
        let options = ClientOptions::default()
            .with_cache_expire(Duration::from_secs(1))
            .with_debug(true)
            .with_header("X-App", "demo")
            .with_unescape_entities(true);
        assert_eq!(options.cache_expire, 1000);
        assert!(options.debug);
        assert_eq!(options.headers.len(), 1);
        assert!(options.unescape_entities);
    }

    #[test]
    fn oversized_cache_expire_saturates() {
        let options = ClientOptions::default().with_cache_expire(Duration::MAX);
        assert_eq!(options.cache_expire, u64::MAX);
        assert_eq!(options.cache_ttl(), Duration::from_millis(u64::MAX));
    }
}
