use crate::client::core::KappaClient;
use crate::config::{ClientConfig, ConfigOverrides};
use crate::Result;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Every setting is optional; unset values fall back to `KAPPAML_*` environment
/// variables and then to built-in defaults (see [`crate::config`]).
#[derive(Debug, Clone, Default)]
pub struct KappaClientBuilder {
    overrides: ConfigOverrides,
}

impl KappaClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// API key. Takes precedence over `KAPPAML_API_KEY`.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.overrides.api_key = Some(api_key.into());
        self
    }

    /// Override the API root (e.g. a staging deployment or a mock server).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.overrides.base_url = Some(base_url.into());
        self
    }

    /// Upper bound for each individual HTTP request.
    ///
    /// This is not the deployment-wait deadline, which is set per
    /// [`crate::client::CreateModelRequest::timeout`].
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.overrides.request_timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.overrides.connect_timeout = Some(timeout);
        self
    }

    /// Delay between deployment status checks.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.overrides.poll_interval = Some(interval);
        self
    }

    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.overrides.proxy = Some(proxy_url.into());
        self
    }

    /// Resolve configuration against the process environment and open the session.
    pub fn build(self) -> Result<KappaClient> {
        KappaClient::with_config(ClientConfig::from_env(self.overrides)?)
    }

    /// Like [`build`](Self::build), reading fallbacks through `env` instead of the
    /// process environment.
    pub fn build_with_env<F>(self, env: F) -> Result<KappaClient>
    where
        F: Fn(&str) -> Option<String>,
    {
        KappaClient::with_config(ClientConfig::resolve(self.overrides, env)?)
    }
}
