//! API key sources
//!
//! Credentials are looked up on every call rather than cached in the client,
//! so a key rotated in the environment takes effect on the next request.

use std::fmt;

/// Source of the service API key
pub trait ApiKeyProvider: Send + Sync {
    /// Current key, or `None` when no usable key is configured
    fn api_key(&self) -> Option<String>;
}

/// Reads the key from environment variables, first non-empty wins
#[derive(Clone)]
pub struct EnvApiKey {
    vars: Vec<String>,
}

impl EnvApiKey {
    /// Look up `primary`, then `API_KEY`
    pub fn new(primary: &str) -> Self {
        Self {
            vars: vec![primary.to_string(), "API_KEY".to_string()],
        }
    }
}

impl ApiKeyProvider for EnvApiKey {
    fn api_key(&self) -> Option<String> {
        self.vars
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for EnvApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvApiKey").field("vars", &self.vars).finish()
    }
}

/// Fixed key, mainly for tests and embedding
#[derive(Clone)]
pub struct StaticApiKey(String);

impl StaticApiKey {
    /// Wrap a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl ApiKeyProvider for StaticApiKey {
    fn api_key(&self) -> Option<String> {
        if self.0.trim().is_empty() {
            None
        } else {
            Some(self.0.clone())
        }
    }
}

impl fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticApiKey(***)")
    }
}
