//! Client configuration resolution.
//!
//! All settings are resolved exactly once, when a client is built: an explicit
//! builder value wins, then the process environment, then the built-in default.
//! The environment is read through an injectable lookup so resolution can be
//! exercised without mutating process state.

use crate::{Error, ErrorContext, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.kappaml.com/v1";

pub const API_KEY_ENV: &str = "KAPPAML_API_KEY";
pub const BASE_URL_ENV: &str = "KAPPAML_BASE_URL";
pub const HTTP_TIMEOUT_ENV: &str = "KAPPAML_HTTP_TIMEOUT_SECS";
pub const POLL_INTERVAL_ENV: &str = "KAPPAML_POLL_INTERVAL_MS";
pub const POOL_MAX_IDLE_ENV: &str = "KAPPAML_HTTP_POOL_MAX_IDLE_PER_HOST";
pub const POOL_IDLE_TIMEOUT_ENV: &str = "KAPPAML_HTTP_POOL_IDLE_TIMEOUT_SECS";
pub const PROXY_URL_ENV: &str = "KAPPAML_PROXY_URL";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 32;
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// A non-empty API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for empty or whitespace-only keys.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Values supplied explicitly by the caller, each overriding its environment fallback.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub proxy: Option<String>,
}

/// Fully resolved client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: ApiKey,
    pub base_url: Url,
    /// Upper bound for a single HTTP round trip.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay between deployment status checks.
    pub poll_interval: Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    pub proxy: Option<String>,
}

impl ClientConfig {
    /// Resolve against the process environment.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve<F>(overrides: ConfigOverrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // An explicit empty key falls through to the environment.
        let api_key = overrides
            .api_key
            .and_then(ApiKey::new)
            .or_else(|| env(API_KEY_ENV).and_then(ApiKey::new))
            .ok_or_else(|| {
                Error::configuration_with_context(
                    format!(
                        "API key must be provided or set as {} env var",
                        API_KEY_ENV
                    ),
                    ErrorContext::new()
                        .with_field_path("api_key")
                        .with_source("config"),
                )
            })?;

        let raw_base_url = overrides
            .base_url
            .or_else(|| env(BASE_URL_ENV).filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&raw_base_url)?;

        let request_timeout = overrides
            .request_timeout
            .or_else(|| env_parse::<u64, _>(&env, HTTP_TIMEOUT_ENV).map(Duration::from_secs))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let connect_timeout = overrides
            .connect_timeout
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);
        let poll_interval = overrides
            .poll_interval
            .or_else(|| env_parse::<u64, _>(&env, POLL_INTERVAL_ENV).map(Duration::from_millis))
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        ensure_positive("request_timeout", request_timeout)?;
        ensure_positive("connect_timeout", connect_timeout)?;
        ensure_positive("poll_interval", poll_interval)?;

        let pool_max_idle_per_host = env_parse::<usize, _>(&env, POOL_MAX_IDLE_ENV)
            .unwrap_or(DEFAULT_POOL_MAX_IDLE_PER_HOST);
        let pool_idle_timeout = env_parse::<u64, _>(&env, POOL_IDLE_TIMEOUT_ENV)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POOL_IDLE_TIMEOUT);

        let proxy = overrides
            .proxy
            .or_else(|| env(PROXY_URL_ENV))
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            api_key,
            base_url,
            request_timeout,
            connect_timeout,
            poll_interval,
            pool_max_idle_per_host,
            pool_idle_timeout,
            proxy,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let invalid = |details: String| {
        Error::configuration_with_context(
            format!("Invalid base URL '{}'", raw),
            ErrorContext::new()
                .with_field_path("base_url")
                .with_details(details)
                .with_source("config"),
        )
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()));
    }
    Ok(url)
}

pub(crate) fn ensure_positive(field: &str, value: Duration) -> Result<()> {
    if value.is_zero() {
        return Err(Error::validation_with_context(
            format!("{} must be positive", field),
            ErrorContext::new().with_field_path(field.to_string()),
        ));
    }
    Ok(())
}

fn env_parse<T, F>(env: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = env(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env = key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn with_key(key: &str) -> ConfigOverrides {
        ConfigOverrides {
            api_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_key_wins_over_env() {
        let cfg = ClientConfig::resolve(
            with_key("explicit"),
            env_of(&[(API_KEY_ENV, "from-env")]),
        )
        .unwrap();
        assert_eq!(cfg.api_key.expose(), "explicit");
    }

    #[test]
    fn test_env_key_used_as_fallback() {
        let cfg =
            ClientConfig::resolve(ConfigOverrides::default(), env_of(&[(API_KEY_ENV, "from-env")]))
                .unwrap();
        assert_eq!(cfg.api_key.expose(), "from-env");
        assert_eq!(cfg.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(cfg.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(cfg.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_empty_explicit_key_falls_back_to_env() {
        let cfg = ClientConfig::resolve(with_key("   "), env_of(&[(API_KEY_ENV, "from-env")]))
            .unwrap();
        assert_eq!(cfg.api_key.expose(), "from-env");
    }

    #[test]
    fn test_missing_key_is_usage_error() {
        let err = ClientConfig::resolve(ConfigOverrides::default(), env_of(&[(API_KEY_ENV, "")]))
            .unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains(API_KEY_ENV));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("api_key")
        );
    }

    #[test]
    fn test_base_url_resolution() {
        let cfg = ClientConfig::resolve(
            with_key("k"),
            env_of(&[(BASE_URL_ENV, "http://localhost:8080/v1")]),
        )
        .unwrap();
        assert_eq!(cfg.base_url.as_str(), "http://localhost:8080/v1");

        let err = ClientConfig::resolve(
            ConfigOverrides {
                base_url: Some("ftp://example.com".into()),
                ..with_key("k")
            },
            env_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));

        assert!(ClientConfig::resolve(
            ConfigOverrides {
                base_url: Some("not a url".into()),
                ..with_key("k")
            },
            env_of(&[]),
        )
        .is_err());
    }

    #[test]
    fn test_env_numbers_and_garbage() {
        let cfg = ClientConfig::resolve(
            with_key("k"),
            env_of(&[
                (HTTP_TIMEOUT_ENV, "5"),
                (POLL_INTERVAL_ENV, "250"),
                (POOL_MAX_IDLE_ENV, "lots"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.pool_max_idle_per_host, DEFAULT_POOL_MAX_IDLE_PER_HOST);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = ClientConfig::resolve(
            ConfigOverrides {
                poll_interval: Some(Duration::ZERO),
                ..with_key("k")
            },
            env_of(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(****)");
        assert!(ApiKey::new("").is_none());
    }
}
