use std::fmt;
use std::time::Duration;

use url::Url;

use crate::model::ApiVersion;

/// Settings a client is built with. Fixed for the client's lifetime.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) token: Option<String>,
    pub(crate) user_agent: String,
    pub(crate) version: ApiVersion,
    pub(crate) base_url: Option<Url>,
    pub(crate) min_interval: Duration,
    pub(crate) max_rate_limit_retries: Option<u32>,
    pub(crate) retry_margin: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) page_size: u32,
}

impl ClientConfig {
    pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);
    pub const DEFAULT_RETRY_MARGIN: Duration = Duration::from_millis(100);
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn new() -> Self {
        Self {
            token: None,
            user_agent: default_user_agent(),
            version: ApiVersion::default(),
            base_url: None,
            min_interval: Self::DEFAULT_MIN_INTERVAL,
            max_rate_limit_retries: None,
            retry_margin: Self::DEFAULT_RETRY_MARGIN,
            timeout: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    /// The system token, sent verbatim in `Authorization`.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = version;
        self
    }

    /// Replaces the version's default base URL, e.g. for a self-hosted instance.
    pub fn base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Minimum spacing between the starts of two requests.
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Gives up with [`Error::RateLimited`](crate::Error::RateLimited) after
    /// `retries` consecutive 429s. Unbounded unless set.
    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.max_rate_limit_retries = Some(retries);
        self
    }

    /// Extra wait added on top of the server's `Retry-After`.
    pub fn retry_margin(mut self, margin: Duration) -> Self {
        self.retry_margin = margin;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Items requested per page of a listing. Clamped to 1..=100.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size.clamp(1, Self::DEFAULT_PAGE_SIZE);
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn api_version(&self) -> ApiVersion {
        self.version
    }

    pub(crate) fn resolved_base_url(&self) -> Result<Url, url::ParseError> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.version.base_url()),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("version", &self.version)
            .field("base_url", &self.base_url)
            .field("min_interval", &self.min_interval)
            .field("max_rate_limit_retries", &self.max_rate_limit_retries)
            .field("retry_margin", &self.retry_margin)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .finish()
    }
}

pub fn default_user_agent() -> String {
    format!("pluralkit-rs/v{}", env!("CARGO_PKG_VERSION"))
}
