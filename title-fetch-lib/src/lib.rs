//! # Title Fetch Library
//!
//! Fetches a list of web pages concurrently and reports each page's title.
//!
//! URLs are dispatched in fixed-size batches. Every URL gets its own task,
//! its own deadline and its own failure handling, and all requests share a
//! single HTTP client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use title_fetch_lib::{read_urls, resolve_proxy, Dispatcher, FetchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let urls = read_urls("urls.txt")?;
//!     let config = FetchConfig::default().with_proxy(resolve_proxy(None));
//!
//!     let dispatcher = Dispatcher::new(config)?;
//!     dispatcher.run(urls).await;
//!     Ok(())
//! }
//! ```

// Re-export main public API types and functions
pub use client::build_client;
pub use concurrent::{CompletionTracker, UnitGuard};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, MAX_CONCURRENCY,
};
pub use dispatcher::{batches, Dispatcher};
pub use error::TitleFetchError;
pub use proxy::{parse_proxy_url, resolve_proxy, resolve_proxy_with, EnvProxies, ProxySetting};
pub use source::read_urls;
pub use title::extract_title;
pub use types::{
    DispatchSummary, FetchConfig, PageTitle, DEFAULT_BATCH_SIZE, DEFAULT_REQUEST_TIMEOUT,
};
pub use worker::{fetch_title, StdoutSink, TitleSink};

mod client;
mod concurrent;
mod config;
mod dispatcher;
mod error;
mod proxy;
mod source;
mod title;
mod types;
mod worker;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, TitleFetchError>;

/// Library version, reported by the CLI's `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
