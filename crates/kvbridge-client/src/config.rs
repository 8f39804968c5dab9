//! Bridge client configuration

use std::time::Duration;

/// Configuration for [`BridgeClient`](crate::BridgeClient)
#[derive(Debug, Clone)]
pub struct BridgeClientConfig {
    /// Server base URL (e.g., "http://127.0.0.1:47168")
    pub base_url: String,

    /// Total timeout of a request/response call; watch streams are exempt
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User-Agent header value
    pub user_agent: String,
}

impl Default for BridgeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:47168".to_string(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("kvbridge-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BridgeClientConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL; a trailing slash is dropped
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Set the total timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let config = BridgeClientConfig::new().base_url("http://localhost:8000/");
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_defaults() {
        let config = BridgeClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("kvbridge-client/"));
    }
}
