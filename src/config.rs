//! Runtime configuration.

use std::time::Duration;

use crate::error::{ChatError, ChatResult};

/// Default list-query page size
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default polling cadence of the query poller (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default upload size limit: 20 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Default upload chunk size: 64 KiB
pub const DEFAULT_UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

pub const ENV_PAGE_SIZE: &str = "CHATLINE_PAGE_SIZE";
pub const ENV_POLL_MS: &str = "CHATLINE_POLL_MS";
pub const ENV_MAX_UPLOAD_BYTES: &str = "CHATLINE_MAX_UPLOAD_BYTES";
pub const ENV_BACKEND_URL: &str = "CHATLINE_BACKEND_URL";
pub const ENV_AUTH_TOKEN: &str = "CHATLINE_AUTH_TOKEN";

/// Configuration for the chat engine and its HTTP backend.
///
/// # Example
///
/// ```ignore
/// use chatline::config::ChatConfig;
///
/// let config = ChatConfig::default()
///     .with_page_size(100)
///     .with_backend_url("https://example.convex.cloud");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Messages requested per list query
    pub page_size: usize,
    /// How often the poller refreshes both queries
    pub poll_interval: Duration,
    /// Files above this size are rejected before any request
    pub max_upload_bytes: u64,
    /// Upload body chunk size; progress is reported per chunk
    pub upload_chunk_bytes: usize,
    /// Base URL of the function API
    pub backend_url: Option<String>,
    /// Bearer token sent with every backend request
    pub auth_token: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_chunk_bytes: DEFAULT_UPLOAD_CHUNK_BYTES,
            backend_url: None,
            auth_token: None,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Set the upload chunk size (clamped to at least one byte).
    pub fn with_upload_chunk_bytes(mut self, chunk: usize) -> Self {
        self.upload_chunk_bytes = chunk.max(1);
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = Some(url.into());
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Build a config from `CHATLINE_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparsable numbers are an error.
    pub fn from_env() -> ChatResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            let page_size: usize = parse_number(ENV_PAGE_SIZE, &value)?;
            if page_size == 0 {
                return Err(ChatError::Config {
                    key: ENV_PAGE_SIZE.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
            config.page_size = page_size;
        }
        if let Some(value) = lookup(ENV_POLL_MS) {
            let millis: u64 = parse_number(ENV_POLL_MS, &value)?;
            config.poll_interval = Duration::from_millis(millis.max(1));
        }
        if let Some(value) = lookup(ENV_MAX_UPLOAD_BYTES) {
            config.max_upload_bytes = parse_number(ENV_MAX_UPLOAD_BYTES, &value)?;
        }
        config.backend_url = lookup(ENV_BACKEND_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        config.auth_token = lookup(ENV_AUTH_TOKEN).filter(|token| !token.trim().is_empty());

        tracing::debug!(
            page_size = config.page_size,
            poll_ms = config.poll_interval.as_millis() as u64,
            has_backend = config.backend_url.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn parse_number<T>(key: &str, value: &str) -> ChatResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ChatError::Config {
        key: key.to_string(),
        message: format!("'{}' is not a valid number ({})", value, e),
    })
}
