use std::fmt::{self, Debug, Formatter};

pub const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Builder for [`TavilyConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TavilyConfigBuilder {
    api_key: String,
    base_url: Option<String>,
}

impl TavilyConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> TavilyConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        TavilyConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Debug for TavilyConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Tavily search provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TavilyConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

impl TavilyConfig {
    #[inline]
    pub(crate) fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

impl Debug for TavilyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}
