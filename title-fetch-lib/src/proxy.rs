//! Proxy resolution.
//!
//! The proxy policy is decided once at startup and handed to the client
//! factory as a plain value. The process environment is only consulted in
//! [`EnvProxies::from_env`].

use crate::error::TitleFetchError;
use reqwest::{ClientBuilder, NoProxy, Proxy, Url};
use std::env;
use std::fmt;
use tracing::warn;

/// Proxy settings captured from `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvProxies {
    /// Proxy used for `http://` targets
    pub http: Option<Url>,
    /// Proxy used for `https://` targets
    pub https: Option<Url>,
    /// Raw `NO_PROXY` exclusion list
    pub no_proxy: Option<String>,
}

impl EnvProxies {
    /// Capture the proxy variables of the current process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Capture proxy variables through an arbitrary lookup.
    ///
    /// Uppercase names take precedence over lowercase ones. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |upper: &str, lower: &str| {
            lookup(upper)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| lookup(lower).filter(|v| !v.trim().is_empty()))
        };

        Self {
            http: read("HTTP_PROXY", "http_proxy")
                .and_then(|v| parse_env_proxy("HTTP_PROXY", &v)),
            https: read("HTTPS_PROXY", "https_proxy")
                .and_then(|v| parse_env_proxy("HTTPS_PROXY", &v)),
            no_proxy: read("NO_PROXY", "no_proxy").map(|v| v.trim().to_string()),
        }
    }

    /// True when no proxy is configured for either scheme.
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }

    /// Hosts that bypass the environment proxies: loopback always, plus
    /// whatever `NO_PROXY` lists.
    pub fn exclusions(&self) -> String {
        match self.no_proxy.as_deref() {
            Some(extra) => format!("{},{}", LOOPBACK_EXCLUSIONS, extra),
            None => LOOPBACK_EXCLUSIONS.to_string(),
        }
    }
}

/// Loopback targets never go through an environment proxy.
const LOOPBACK_EXCLUSIONS: &str = "localhost,127.0.0.0/8,::1";

/// Environment values may omit the scheme (`proxy.local:3128`).
fn parse_env_proxy(var: &str, value: &str) -> Option<Url> {
    let value = value.trim();
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    };

    match parse_proxy_url(&candidate) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Ignoring {}: {}", var, e);
            None
        }
    }
}

/// How outgoing requests pick a proxy for the whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProxySetting {
    /// Scheme-specific proxies captured from the environment at startup
    Environment(EnvProxies),
    /// Every request goes through this proxy
    Explicit(Url),
    /// Connect directly
    #[default]
    Direct,
}

impl ProxySetting {
    /// Install this policy on a client builder.
    ///
    /// Every branch replaces reqwest's implicit system proxy lookup, so the
    /// policy resolved at startup is the only one in effect.
    pub fn apply(&self, builder: ClientBuilder) -> Result<ClientBuilder, TitleFetchError> {
        match self {
            Self::Direct => Ok(builder.no_proxy()),
            Self::Explicit(url) => {
                let proxy = Proxy::all(url.as_str())
                    .map_err(|e| TitleFetchError::config(format!("Invalid proxy: {}", e)))?;
                Ok(builder.no_proxy().proxy(proxy))
            }
            Self::Environment(env) => {
                let mut builder = builder.no_proxy();
                let exclusions = || NoProxy::from_string(&env.exclusions());

                if let Some(url) = &env.http {
                    let proxy = Proxy::http(url.as_str())
                        .map_err(|e| {
                            TitleFetchError::config(format!("Invalid HTTP_PROXY: {}", e))
                        })?
                        .no_proxy(exclusions());
                    builder = builder.proxy(proxy);
                }
                if let Some(url) = &env.https {
                    let proxy = Proxy::https(url.as_str())
                        .map_err(|e| {
                            TitleFetchError::config(format!("Invalid HTTPS_PROXY: {}", e))
                        })?
                        .no_proxy(exclusions());
                    builder = builder.proxy(proxy);
                }
                Ok(builder)
            }
        }
    }
}

impl fmt::Display for ProxySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Explicit(url) => write!(f, "{}", url),
            Self::Environment(env) if env.is_empty() => write!(f, "environment (none set)"),
            Self::Environment(env) => {
                let show = |u: &Option<Url>| u.as_ref().map_or("-".to_string(), Url::to_string);
                write!(f, "environment (http: {}, https: {})", show(&env.http), show(&env.https))
            }
        }
    }
}

/// Parse a proxy URL, requiring an `http`/`https` scheme and a host.
pub fn parse_proxy_url(raw: &str) -> Result<Url, TitleFetchError> {
    let url =
        Url::parse(raw.trim()).map_err(|e| TitleFetchError::proxy_parse(raw, e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TitleFetchError::proxy_parse(
            raw,
            format!("unsupported proxy scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(TitleFetchError::proxy_parse(raw, "missing proxy host"));
    }

    Ok(url)
}

/// Resolve the `-p` value against the process environment.
pub fn resolve_proxy(raw: Option<&str>) -> ProxySetting {
    resolve_proxy_with(raw, EnvProxies::from_env)
}

/// Resolve a proxy string, falling back to `env` when none is given.
///
/// A malformed proxy string is logged and degrades to direct connections.
pub fn resolve_proxy_with<F>(raw: Option<&str>, env: F) -> ProxySetting
where
    F: FnOnce() -> EnvProxies,
{
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => ProxySetting::Environment(env()),
        Some(raw) => match parse_proxy_url(raw) {
            Ok(url) => ProxySetting::Explicit(url),
            Err(e) => {
                warn!("{}; continuing without a proxy", e);
                ProxySetting::Direct
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_malformed_proxy_degrades_to_direct() {
        let setting = resolve_proxy_with(Some("::::"), || panic!("env must not be read"));
        assert_eq!(setting, ProxySetting::Direct);
    }

    #[test]
    fn test_unsupported_scheme_degrades_to_direct() {
        let setting = resolve_proxy_with(Some("ftp://proxy.test:21"), EnvProxies::default);
        assert_eq!(setting, ProxySetting::Direct);
    }

    #[test]
    fn test_explicit_proxy() {
        let setting = resolve_proxy_with(Some("http://127.0.0.1:8080"), EnvProxies::default);
        match setting {
            ProxySetting::Explicit(url) => {
                assert_eq!(url.host_str(), Some("127.0.0.1"));
                assert_eq!(url.port(), Some(8080));
            }
            other => panic!("expected explicit proxy, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_proxy_uses_environment() {
        let env = EnvProxies::from_lookup(lookup_from(&[("HTTPS_PROXY", "http://corp:3128")]));
        let setting = resolve_proxy_with(None, || env.clone());
        assert_eq!(setting, ProxySetting::Environment(env));

        let setting = resolve_proxy_with(Some("   "), EnvProxies::default);
        assert_eq!(setting, ProxySetting::Environment(EnvProxies::default()));
    }

    #[test]
    fn test_env_uppercase_wins_and_scheme_is_optional() {
        let env = EnvProxies::from_lookup(lookup_from(&[
            ("HTTP_PROXY", "upper.test:3128"),
            ("http_proxy", "http://lower.test:3128"),
            ("https_proxy", "https://secure.test:443"),
            ("no_proxy", "localhost,.internal"),
        ]));

        assert_eq!(env.http.unwrap().as_str(), "http://upper.test:3128/");
        assert_eq!(env.https.unwrap().host_str(), Some("secure.test"));
        assert_eq!(env.no_proxy.as_deref(), Some("localhost,.internal"));
    }

    #[test]
    fn test_env_empty_values_are_unset() {
        let env =
            EnvProxies::from_lookup(lookup_from(&[("HTTP_PROXY", ""), ("HTTPS_PROXY", "  ")]));
        assert!(env.is_empty());
    }

    #[test]
    fn test_loopback_always_excluded() {
        let env = EnvProxies::from_lookup(lookup_from(&[("HTTP_PROXY", "http://corp:3128")]));
        assert_eq!(env.exclusions(), "localhost,127.0.0.0/8,::1");

        let env = EnvProxies::from_lookup(lookup_from(&[
            ("HTTP_PROXY", "http://corp:3128"),
            ("NO_PROXY", ".internal"),
        ]));
        assert_eq!(env.exclusions(), "localhost,127.0.0.0/8,::1,.internal");
    }

    #[test]
    fn test_apply_builds_client_for_every_setting() {
        let env = EnvProxies::from_lookup(lookup_from(&[
            ("HTTP_PROXY", "http://corp:3128"),
            ("NO_PROXY", "localhost"),
        ]));
        let settings = [
            ProxySetting::Direct,
            ProxySetting::Explicit(Url::parse("http://proxy.test:8080").unwrap()),
            ProxySetting::Environment(env),
            ProxySetting::Environment(EnvProxies::default()),
        ];

        for setting in settings {
            let builder = setting.apply(reqwest::Client::builder()).unwrap();
            assert!(builder.build().is_ok(), "client for {} should build", setting);
        }
    }
}
