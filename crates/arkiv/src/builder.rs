//! # Builder for FetcherConfig
//!
//! Fluent construction of [`FetcherConfig`] instances for the HTTP fetch
//! backend.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::config::FetcherConfig;

/// Builder for creating FetcherConfig instances with a fluent API
#[derive(Debug, Clone, Default)]
pub struct FetcherConfigBuilder {
    config: FetcherConfig,
}

impl FetcherConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall timeout for the entire transfer (zero disables it)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom header, on top of the browser-like defaults
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(header_name), Ok(header_value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.config.headers.insert(header_name, header_value);
        } else {
            tracing::warn!("Ignoring invalid header: {}: {}", name, value);
        }
        self
    }

    /// Set the cookie string file sent with every fetch
    pub fn with_cookies_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cookies_file = Some(path.into());
        self
    }

    /// Build the final FetcherConfig
    pub fn build(self) -> FetcherConfig {
        self.config
    }
}
