//! Client configuration.

use std::time::Duration;
use url::Url;

/// API version the client speaks.
pub const API_VERSION: u32 = 3;

/// Default versioned API root.
pub const DEFAULT_BASE_URL: &str = "https://report.netcraft.com/api/v3/";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default `User-Agent` header.
pub const DEFAULT_USER_AGENT: &str = concat!("netcraft-rs/", env!("CARGO_PKG_VERSION"));

/// Maximum number of characters of a response body kept in error messages.
pub const PREVIEW_MAX_LENGTH: usize = 500;

/// Netcraft client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) preview_limit: usize,
}

impl Config {
    /// Get the API base URL. Always ends with `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the `User-Agent` header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Get the maximum preview length for error bodies.
    pub fn preview_limit(&self) -> usize {
        self.preview_limit
    }
}

/// Builder for the Netcraft client.
#[derive(Debug, Default)]
pub struct NetcraftBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    preview_limit: Option<usize>,
}

impl NetcraftBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the `User-Agent` header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set how many characters of an unparseable error body are kept.
    pub fn preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = Some(limit);
        self
    }

    /// Build the configuration.
    pub(crate) fn build_config(self) -> Result<Config, crate::Error> {
        let raw = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let mut base_url = Url::parse(&raw)
            .map_err(|e| crate::Error::Config(format!("invalid base_url {raw:?}: {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(crate::Error::Config(format!(
                "base_url must be http or https, got {:?}",
                base_url.scheme()
            )));
        }

        // Relative paths only keep the version segment when the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(crate::Error::Config("timeout cannot be zero".into()));
        }

        let user_agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.into());
        if user_agent.trim().is_empty() {
            return Err(crate::Error::Config("user_agent cannot be empty".into()));
        }

        let preview_limit = self.preview_limit.unwrap_or(PREVIEW_MAX_LENGTH);
        if preview_limit == 0 {
            return Err(crate::Error::Config("preview_limit cannot be zero".into()));
        }

        Ok(Config {
            base_url,
            timeout,
            user_agent,
            preview_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = NetcraftBuilder::new().build_config().unwrap();

        assert_eq!(config.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(config.preview_limit(), PREVIEW_MAX_LENGTH);
    }

    #[test]
    fn test_default_base_url_matches_version() {
        assert!(DEFAULT_BASE_URL.ends_with(&format!("/api/v{API_VERSION}/")));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = NetcraftBuilder::new()
            .base_url("http://127.0.0.1:8080/api/v3/")
            .timeout(Duration::from_secs(30))
            .user_agent("tests/1.0")
            .preview_limit(64)
            .build_config()
            .unwrap();

        assert_eq!(config.base_url().as_str(), "http://127.0.0.1:8080/api/v3/");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.user_agent(), "tests/1.0");
        assert_eq!(config.preview_limit(), 64);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = NetcraftBuilder::new()
            .base_url("https://example.com/api/v3")
            .build_config()
            .unwrap();

        assert_eq!(config.base_url().as_str(), "https://example.com/api/v3/");
        assert_eq!(
            config.base_url().join("report/urls").unwrap().as_str(),
            "https://example.com/api/v3/report/urls"
        );
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(NetcraftBuilder::new().base_url("not a url").build_config().is_err());
        assert!(NetcraftBuilder::new()
            .base_url("ftp://example.com/")
            .build_config()
            .is_err());
        assert!(NetcraftBuilder::new()
            .timeout(Duration::ZERO)
            .build_config()
            .is_err());
        assert!(NetcraftBuilder::new().user_agent("  ").build_config().is_err());
        assert!(NetcraftBuilder::new().preview_limit(0).build_config().is_err());
    }
}
