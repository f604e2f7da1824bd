//! Error handling for title fetching operations.
//!
//! Two kinds of failure stop a run before any network activity
//! (`ConfigError`, `FileError`). Everything else is scoped to a single URL
//! and is logged by the worker that hit it.

use std::fmt;
use std::time::Duration;

/// Main error type for title fetching operations.
#[derive(Debug, Clone)]
pub enum TitleFetchError {
    /// Missing or invalid configuration (flags, env vars, config file)
    ConfigError { message: String },

    /// URL list or config file could not be read
    FileError { path: String, message: String },

    /// Proxy URL could not be parsed; the run continues without a proxy
    ProxyParseError { proxy: String, message: String },

    /// The GET request could not be built (malformed URL, unsupported scheme)
    RequestBuild { url: String, message: String },

    /// Connection, TLS or HTTP protocol failure while sending the request
    Network { url: String, message: String },

    /// The request did not complete within its deadline
    Timeout { url: String, duration: Duration },

    /// The response arrived but its body could not be read
    BodyRead { url: String, message: String },
}

impl TitleFetchError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn proxy_parse<P: Into<String>, M: Into<String>>(proxy: P, message: M) -> Self {
        Self::ProxyParseError {
            proxy: proxy.into(),
            message: message.into(),
        }
    }

    pub fn request_build<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::RequestBuild {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn network<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn timeout<U: Into<String>>(url: U, duration: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            duration,
        }
    }

    pub fn body_read<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::BodyRead {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Map a reqwest failure raised while sending a request for `url`.
    ///
    /// reqwest reports malformed URLs and unsupported schemes as builder
    /// errors at send time, so those become `RequestBuild` rather than
    /// `Network`. The caller's raw `url` and `deadline` are kept because
    /// reqwest's own error carries neither.
    pub fn from_send_error(url: &str, err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout(url, deadline)
        } else if err.is_builder() {
            Self::request_build(url, err.to_string())
        } else {
            Self::network(url, err.to_string())
        }
    }

    /// Whether this error halts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError { .. } | Self::FileError { .. })
    }

    /// The URL this error is scoped to, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::RequestBuild { url, .. }
            | Self::Network { url, .. }
            | Self::Timeout { url, .. }
            | Self::BodyRead { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl fmt::Display for TitleFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::ProxyParseError { proxy, message } => {
                write!(f, "Invalid proxy URL '{}': {}", proxy, message)
            }
            Self::RequestBuild { url, message } => {
                write!(f, "Error creating request for URL {}: {}", url, message)
            }
            Self::Network { url, message } => {
                write!(f, "Error sending request for URL {}: {}", url, message)
            }
            Self::Timeout { url, duration } => {
                write!(f, "Timeout after {:?} for URL {}", duration, url)
            }
            Self::BodyRead { url, message } => {
                write!(f, "Error reading response body for URL {}: {}", url, message)
            }
        }
    }
}

impl std::error::Error for TitleFetchError {}

impl From<toml::de::Error> for TitleFetchError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
