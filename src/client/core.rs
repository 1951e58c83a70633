use crate::client::builder::KappaClientBuilder;
use crate::client::error_classification::{decode_object, ensure_success, Operation};
use crate::client::signals::SessionSignals;
use crate::config::{ClientConfig, ConfigOverrides};
use crate::transport::{HttpSession, RawResponse, SessionState};
use crate::types::{FeatureValue, Features, JsonObject, ModelStatus};
use crate::{Error, ErrorContext, Result};
use futures::future::BoxFuture;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Async client for the KappaML platform.
///
/// All operations take `&self`; share one client across tasks with an `Arc`.
/// The HTTP session is opened when the client is built and released exactly once,
/// by [`close`](Self::close), at the end of [`scope`](Self::scope), or on drop,
/// whichever comes first.
///
/// Dropping an operation's future cancels it. The deployment wait additionally
/// accepts a [`tokio_util::sync::CancellationToken`].
pub struct KappaClient {
    pub(crate) session: HttpSession,
    pub(crate) config: ClientConfig,
}

impl KappaClient {
    /// Create a client with an explicit API key and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        KappaClientBuilder::new().api_key(api_key).build()
    }

    /// Create a client configured entirely from `KAPPAML_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ClientConfig::from_env(ConfigOverrides::default())?)
    }

    pub fn builder() -> KappaClientBuilder {
        KappaClientBuilder::new()
    }

    /// Create a client from an already resolved configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let session = HttpSession::open(&config)?;
        Ok(Self { session, config })
    }

    pub fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Ensure the session is usable. A no-op while open; fails once closed.
    pub fn open(&self) -> Result<()> {
        match self.session.state() {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(Error::SessionClosed),
        }
    }

    /// Release the HTTP session. Idempotent; returns `true` only for the call
    /// that actually released it.
    pub fn close(&self) -> bool {
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.session.state() == SessionState::Closed
    }

    /// Snapshot current session signals.
    pub fn signals(&self) -> SessionSignals {
        SessionSignals {
            state: self.session.state(),
            requests_sent: self.session.requests_sent(),
            releases: self.session.releases(),
        }
    }

    /// Run `f` with this client and release the session on every exit path:
    /// success, error, panic, or the returned future being dropped.
    ///
    /// ```rust,no_run
    /// # async fn run() -> kappaml::Result<()> {
    /// use kappaml::{Features, KappaClient};
    ///
    /// let client = KappaClient::from_env()?;
    /// let metrics = client
    ///     .scope(|c| {
    ///         Box::pin(async move {
    ///             c.learn("model-id", &Features::new().with("x", 1.0), 2.0).await?;
    ///             c.get_metrics("model-id").await
    ///         })
    ///     })
    ///     .await?;
    /// assert!(client.is_closed());
    /// # let _ = metrics;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scope<'a, T, F>(&'a self, f: F) -> Result<T>
    where
        F: FnOnce(&'a KappaClient) -> BoxFuture<'a, Result<T>>,
    {
        self.open()?;
        let _release = ReleaseOnDrop(&self.session);
        f(self).await
    }

    /// Fetch the current status of a model.
    pub async fn get_model_status(&self, model_id: &str) -> Result<ModelStatus> {
        require_model_id(model_id)?;
        let resp = self
            .call(
                Operation::GetModelStatus,
                Some(model_id),
                Method::GET,
                &["models", model_id],
                None,
            )
            .await?;
        let body = decode_object(Operation::GetModelStatus, &resp)?;
        ModelStatus::from_response(model_id, &body)
    }

    /// Submit features and return the service's prediction payload verbatim.
    pub async fn predict(&self, model_id: &str, features: &Features) -> Result<JsonObject> {
        require_model_id(model_id)?;
        features.ensure_finite()?;
        let body = json!({ "features": features });
        let resp = self
            .call(
                Operation::Predict,
                Some(model_id),
                Method::POST,
                &["models", model_id, "predict"],
                Some(&body),
            )
            .await?;
        decode_object(Operation::Predict, &resp)
    }

    /// Submit one labelled example for online learning.
    pub async fn learn(
        &self,
        model_id: &str,
        features: &Features,
        target: impl Into<FeatureValue>,
    ) -> Result<JsonObject> {
        require_model_id(model_id)?;
        features.ensure_finite()?;
        let target = target.into();
        target.ensure_finite("target")?;
        let body = json!({ "features": features, "target": target });
        let resp = self
            .call(
                Operation::Learn,
                Some(model_id),
                Method::POST,
                &["models", model_id, "learn"],
                Some(&body),
            )
            .await?;
        decode_object(Operation::Learn, &resp)
    }

    /// Fetch the current metrics of a model.
    pub async fn get_metrics(&self, model_id: &str) -> Result<JsonObject> {
        require_model_id(model_id)?;
        let resp = self
            .call(
                Operation::GetMetrics,
                Some(model_id),
                Method::GET,
                &["models", model_id, "metrics"],
                None,
            )
            .await?;
        decode_object(Operation::GetMetrics, &resp)
    }

    /// Delete a model. An unknown model is reported as [`Error::ModelNotFound`].
    pub async fn delete_model(&self, model_id: &str) -> Result<()> {
        require_model_id(model_id)?;
        self.call(
            Operation::DeleteModel,
            Some(model_id),
            Method::DELETE,
            &["models", model_id],
            None,
        )
        .await?;
        info!(model_id = %model_id, "model deleted");
        Ok(())
    }

    pub(crate) async fn call(
        &self,
        op: Operation,
        model_id: Option<&str>,
        method: Method,
        segments: &[&str],
        body: Option<&serde_json::Value>,
    ) -> Result<RawResponse> {
        let resp = self.session.send(method, segments, body).await?;
        ensure_success(op, model_id, resp)
    }
}

struct ReleaseOnDrop<'a>(&'a HttpSession);

impl Drop for ReleaseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

fn require_model_id(model_id: &str) -> Result<()> {
    if model_id.trim().is_empty() {
        return Err(Error::validation_with_context(
            "model id must not be empty",
            ErrorContext::new().with_field_path("model_id"),
        ));
    }
    Ok(())
}
