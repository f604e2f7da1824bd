//! Core data types for title fetching.
//!
//! This module defines the run configuration, the per-page result line and
//! the dispatch summary.

use crate::error::TitleFetchError;
use crate::proxy::ProxySetting;
use std::fmt;
use std::time::Duration;

/// Number of URLs grouped into one dispatch unit.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Deadline for one request, covering connect, headers and body.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Title of one fetched page.
///
/// Renders as `"<title> (<url>)"`. An empty title still renders, giving
/// `" (<url>)"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTitle {
    /// URL exactly as it appeared in the input list
    pub url: String,
    /// Extracted title text, possibly empty
    pub title: String,
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.url)
    }
}

/// Counts of the work a dispatcher run launched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Per-URL units spawned
    pub urls: usize,
    /// Batch units spawned
    pub batches: usize,
}

/// Configuration for a fetch run.
///
/// The client built from it is shared by every request and never changes
/// after construction.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// URLs grouped per dispatch unit.
    /// Default: 20. Grouping only; it does not cap in-flight requests.
    pub batch_size: usize,

    /// Per-request deadline
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// Optional ceiling on simultaneous requests across all batches.
    /// Default: None (every URL starts as soon as its batch is dispatched)
    pub max_in_flight: Option<usize>,

    /// Skip TLS certificate verification.
    /// Default: false. Scanning arbitrary hosts usually wants this on.
    pub accept_invalid_certs: bool,

    /// Proxy policy resolved at startup
    /// Default: direct connections
    pub proxy: ProxySetting,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_in_flight: None,
            accept_invalid_certs: false,
            proxy: ProxySetting::Direct,
        }
    }
}

impl FetchConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Cap simultaneous requests. `None` keeps unbounded fan-out.
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySetting) -> Self {
        self.proxy = proxy;
        self
    }

    /// Reject settings the dispatcher cannot run with.
    pub fn validate(&self) -> Result<(), TitleFetchError> {
        if self.batch_size == 0 {
            return Err(TitleFetchError::config("Batch size must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(TitleFetchError::config("Request timeout must be greater than zero"));
        }
        if self.max_in_flight == Some(0) {
            return Err(TitleFetchError::config("Concurrency must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_title_display() {
        let page = PageTitle {
            url: "https://example.com".to_string(),
            title: "Example Domain".to_string(),
        };
        assert_eq!(page.to_string(), "Example Domain (https://example.com)");
    }

    #[test]
    fn test_empty_title_still_renders() {
        let page = PageTitle {
            url: "https://example.com".to_string(),
            title: String::new(),
        };
        assert_eq!(page.to_string(), " (https://example.com)");
    }

    #[test]
    fn test_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_in_flight, None);
        assert!(!config.accept_invalid_certs);
        assert_eq!(config.proxy, ProxySetting::Direct);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(FetchConfig::default().with_batch_size(0).validate().is_err());
        assert!(FetchConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
        assert!(FetchConfig::default()
            .with_max_in_flight(Some(0))
            .validate()
            .is_err());
        assert!(FetchConfig::default()
            .with_max_in_flight(Some(1))
            .validate()
            .is_ok());
    }
}
