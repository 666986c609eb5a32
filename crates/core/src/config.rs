//! Client runtime configuration.
//!
//! The API base URL and the view settings are resolved once at process start-up and then passed
//! into the client and controller. Nothing here reads environment variables; binaries read them
//! in `main` and hand the raw values to the helpers below.

use crate::constants::{
    API_PATH, DEFAULT_HOST, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT, DEV_API_BASE, LOCAL_HOSTS,
    PAGE_SIZE_OPTIONS, SEARCH_DEBOUNCE,
};
use registro_types::ExportFormat;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API base URL {0:?}: must start with http:// or https://")]
    InvalidApiBase(String),
    #[error("invalid request timeout {0:?}: expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("page size options cannot be empty or contain zero")]
    InvalidPageSizes,
    #[error("default page size {0} is not one of the configured options")]
    DefaultPageSizeNotOffered(u32),
}

/// Client configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base: String,
    request_timeout: Duration,
    page_size_options: Vec<u32>,
    default_page_size: u32,
    search_debounce: Duration,
}

impl ClientConfig {
    /// Create a new `ClientConfig` for the given API base URL with default view settings.
    ///
    /// A trailing slash on the base is dropped so endpoint paths can be joined uniformly.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidApiBase`] if the base is not an absolute http(s) URL.
    pub fn new(api_base: impl Into<String>) -> Result<Self, ConfigError> {
        let api_base = api_base.into();
        let trimmed = api_base.trim().trim_end_matches('/');
        let absolute = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
            .is_some_and(|rest| !rest.is_empty());
        if !absolute {
            return Err(ConfigError::InvalidApiBase(api_base));
        }

        Ok(Self {
            api_base: trimmed.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            default_page_size: DEFAULT_PAGE_SIZE,
            search_debounce: SEARCH_DEBOUNCE,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the operator-selectable page sizes.
    ///
    /// # Errors
    /// Fails if `options` is empty, contains zero, or does not offer `default`.
    pub fn with_page_sizes(mut self, options: Vec<u32>, default: u32) -> Result<Self, ConfigError> {
        if options.is_empty() || options.contains(&0) {
            return Err(ConfigError::InvalidPageSizes);
        }
        if !options.contains(&default) {
            return Err(ConfigError::DefaultPageSizeNotOffered(default));
        }
        self.page_size_options = options;
        self.default_page_size = default;
        Ok(self)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn page_size_options(&self) -> &[u32] {
        &self.page_size_options
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }

    /// Absolute URL for an API path such as `patients/7`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// Download URL for a server-side export.
    pub fn export_url(&self, format: ExportFormat) -> String {
        self.endpoint(&format!("export/{}", format.as_str()))
    }
}

/// Resolve the API base URL from optional raw environment values.
///
/// Priority: an explicit base wins; otherwise a local development host maps to
/// [`DEV_API_BASE`], and any other host maps to `{origin}/api` where `origin` defaults to
/// `https://{host}`.
pub fn resolve_api_base(
    explicit: Option<String>,
    host: Option<String>,
    origin: Option<String>,
) -> String {
    if let Some(base) = non_blank(explicit) {
        return base;
    }

    let host = non_blank(host).unwrap_or_else(|| DEFAULT_HOST.to_string());
    if LOCAL_HOSTS.contains(&host.as_str()) {
        return DEV_API_BASE.to_string();
    }

    let origin = non_blank(origin).unwrap_or_else(|| format!("https://{host}"));
    format!("{}{}", origin.trim_end_matches('/'), API_PATH)
}

/// Parse the request timeout from an optional string value (whole seconds).
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> Result<Duration, ConfigError> {
    let Some(value) = non_blank(value) else {
        return Ok(DEFAULT_REQUEST_TIMEOUT);
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
