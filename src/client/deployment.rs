//! Model creation and the deployment-wait state machine.
//!
//! A created model is not immediately usable: the service deploys it
//! asynchronously. [`CreateModelRequest`] optionally waits for that by polling
//! `GET /models/{id}`:
//!
//! ```text
//!            poll: pending
//!           ┌────────────┐
//!           ▼            │
//!  ──▶  PENDING ─────────┘
//!           │ poll: deployed          ──▶ DEPLOYED  (returns the id)
//!           │ poll: failed            ──▶ FAILED    (Error::Deployment)
//!           │ deadline passed         ──▶ TIMED_OUT (Error::Deployment)
//!           │ cancellation token      ──▶ Error::Cancelled
//! ```
//!
//! Status reports carrying both deployed and failed signals resolve to FAILED.
//! The deadline is a hard wall-clock bound: an in-flight status request is
//! abandoned when it passes.

use crate::client::core::KappaClient;
use crate::client::error_classification::{decode_object, Operation};
use crate::config::ensure_positive;
use crate::error::DeploymentFailure;
use crate::types::{CreatedModel, DeploymentState, MlType, ModelStatus};
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default deployment-wait deadline.
pub const DEFAULT_DEPLOYMENT_TIMEOUT: Duration = Duration::from_secs(60);

// Roughly thirty years; effectively "no deadline".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Builder for `POST /models`, created by [`KappaClient::create_model`].
///
/// Waits for deployment by default.
#[must_use = "requests do nothing until `execute` is awaited"]
pub struct CreateModelRequest<'a> {
    client: &'a KappaClient,
    name: String,
    ml_type: MlType,
    wait_for_deployment: bool,
    timeout: Duration,
    cancel: Option<CancellationToken>,
}

impl<'a> CreateModelRequest<'a> {
    pub(crate) fn new(client: &'a KappaClient, name: String, ml_type: MlType) -> Self {
        Self {
            client,
            name,
            ml_type,
            wait_for_deployment: true,
            timeout: DEFAULT_DEPLOYMENT_TIMEOUT,
            cancel: None,
        }
    }

    /// Whether to block until the model is deployed (default `true`).
    pub fn wait_for_deployment(mut self, wait: bool) -> Self {
        self.wait_for_deployment = wait;
        self
    }

    /// Deadline for the deployment wait (default 60s). Must be positive.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abandon the request (creation or wait) when `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Create the model and return its identifier.
    pub async fn execute(self) -> Result<String> {
        if self.name.trim().is_empty() {
            return Err(Error::validation_with_context(
                "model name must not be empty",
                ErrorContext::new().with_field_path("create_model.name"),
            ));
        }
        ensure_positive("create_model.timeout", self.timeout)?;

        let client = self.client;
        let cancel = self.cancel.as_ref();
        let body = json!({ "name": self.name, "ml_type": self.ml_type });

        let resp = cancellable(
            cancel,
            client.call(
                Operation::CreateModel,
                None,
                Method::POST,
                &["models"],
                Some(&body),
            ),
        )
        .await
        .ok_or_else(|| cancelled("create_model"))??;
        let created = CreatedModel::from_response(&decode_object(Operation::CreateModel, &resp)?)?;

        info!(
            model_id = %created.id,
            name = %self.name,
            ml_type = %self.ml_type,
            status = created.status.as_deref().unwrap_or("unknown"),
            "model created"
        );

        if self.wait_for_deployment {
            client
                .poll_deployment(&created.id, self.timeout, cancel)
                .await?;
        }
        Ok(created.id)
    }
}

impl KappaClient {
    /// Start building a model-creation request.
    ///
    /// ```rust,no_run
    /// # async fn run(client: &kappaml::KappaClient) -> kappaml::Result<()> {
    /// use kappaml::MlType;
    /// use std::time::Duration;
    ///
    /// let model_id = client
    ///     .create_model("temp-sensor", MlType::Regression)
    ///     .timeout(Duration::from_secs(10))
    ///     .execute()
    ///     .await?;
    /// # let _ = model_id;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_model(&self, name: impl Into<String>, ml_type: MlType) -> CreateModelRequest<'_> {
        CreateModelRequest::new(self, name.into(), ml_type)
    }

    /// Wait until an existing model reports deployed, fails, or `timeout` passes.
    pub async fn wait_for_deployment(
        &self,
        model_id: &str,
        timeout: Duration,
    ) -> Result<ModelStatus> {
        self.poll_deployment(model_id, timeout, None).await
    }

    /// [`wait_for_deployment`](Self::wait_for_deployment) that also stops with
    /// [`Error::Cancelled`] when `cancel` fires.
    pub async fn wait_for_deployment_with_cancel(
        &self,
        model_id: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ModelStatus> {
        self.poll_deployment(model_id, timeout, Some(cancel)).await
    }

    pub(crate) async fn poll_deployment(
        &self,
        model_id: &str,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<ModelStatus> {
        ensure_positive("timeout", timeout)?;
        let interval = self.config.poll_interval;
        let started = Instant::now();
        let deadline = started.checked_add(timeout).unwrap_or_else(|| far_future(started));
        let mut polls: u32 = 0;

        loop {
            let poll = tokio::time::timeout_at(deadline, self.get_model_status(model_id));
            let status = match cancellable(cancel, poll)
                .await
                .ok_or_else(|| cancelled("wait_for_deployment"))?
            {
                Ok(status) => status?,
                Err(_) => return Err(timed_out(model_id, started, polls)),
            };
            polls += 1;

            if status.ambiguous {
                warn!(
                    model_id = %model_id,
                    status = %status.status,
                    "status report signals both deployed and failed; treating as failed"
                );
            }

            match status.state {
                DeploymentState::Deployed => {
                    info!(
                        model_id = %model_id,
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "model deployed"
                    );
                    return Ok(status);
                }
                DeploymentState::Failed => {
                    warn!(model_id = %model_id, status = %status.status, polls, "model deployment failed");
                    return Err(Error::Deployment {
                        model_id: model_id.to_string(),
                        failure: DeploymentFailure::Failed,
                    });
                }
                DeploymentState::Pending | DeploymentState::TimedOut => {
                    debug!(model_id = %model_id, status = %status.status, polls, "model not deployed yet");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(timed_out(model_id, started, polls));
            }
            let wake = now
                .checked_add(interval)
                .map_or(deadline, |wake| wake.min(deadline));
            cancellable(cancel, tokio::time::sleep_until(wake))
                .await
                .ok_or_else(|| cancelled("wait_for_deployment"))?;
            if Instant::now() >= deadline {
                return Err(timed_out(model_id, started, polls));
            }
        }
    }
}

/// Runs `fut` to completion unless `token` fires first, in which case `fut`
/// is dropped and `None` is returned.
async fn cancellable<F: Future>(token: Option<&CancellationToken>, fut: F) -> Option<F::Output> {
    match token {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => None,
            out = fut => Some(out),
        },
        None => Some(fut.await),
    }
}

// Deadline used when `timeout` is too large to add to the current instant.
fn far_future(from: Instant) -> Instant {
    from + FAR_FUTURE
}

fn cancelled(operation: &str) -> Error {
    debug!(operation, "operation cancelled");
    Error::Cancelled {
        operation: operation.to_string(),
    }
}

fn timed_out(model_id: &str, started: Instant, polls: u32) -> Error {
    let waited = started.elapsed();
    warn!(
        model_id = %model_id,
        polls,
        elapsed_ms = waited.as_millis() as u64,
        "model deployment timed out"
    );
    Error::Deployment {
        model_id: model_id.to_string(),
        failure: DeploymentFailure::TimedOut { waited },
    }
}
