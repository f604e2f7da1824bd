//! Shared HTTP client construction.

use crate::error::TitleFetchError;
use crate::types::FetchConfig;
use tracing::{debug, warn};

/// Build the one client every request of a run shares.
///
/// Only the proxy policy and certificate handling are configured here.
/// Deadlines are applied per request by the worker, so the client itself
/// carries no timeout.
pub fn build_client(config: &FetchConfig) -> Result<reqwest::Client, TitleFetchError> {
    let builder = config.proxy.apply(reqwest::Client::builder())?;

    if config.accept_invalid_certs {
        warn!("TLS certificate verification is disabled for all requests");
    }
    debug!("HTTP client proxy: {}", config.proxy);

    builder
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| TitleFetchError::config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::resolve_proxy_with;
    use crate::proxy::EnvProxies;

    #[test]
    fn test_build_default_client() {
        assert!(build_client(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn test_build_insecure_client_with_proxy() {
        let proxy = resolve_proxy_with(Some("http://127.0.0.1:3128"), EnvProxies::default);
        let config = FetchConfig::default()
            .with_accept_invalid_certs(true)
            .with_proxy(proxy);
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn test_malformed_proxy_still_builds_client() {
        let proxy = resolve_proxy_with(Some("::::"), EnvProxies::default);
        let config = FetchConfig::default().with_proxy(proxy);
        assert!(build_client(&config).is_ok());
    }
}
