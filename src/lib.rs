//! # kappaml
//!
//! Async Rust client for the [KappaML](https://kappaml.com) online machine learning platform.
//!
//! ## Overview
//!
//! The SDK is a thin, typed layer over the KappaML HTTP API. It:
//!
//! - manages one pooled HTTP session per client, released exactly once
//! - creates models and optionally waits for their asynchronous deployment
//! - submits predictions and training examples, fetches metrics, deletes models
//! - maps every failure into a small closed [`Error`] taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kappaml::{Features, KappaClient, MlType};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> kappaml::Result<()> {
//!     // Reads KAPPAML_API_KEY when no key is given explicitly.
//!     let client = KappaClient::builder().build()?;
//!
//!     let model_id = client
//!         .create_model("temp-sensor", MlType::Regression)
//!         .timeout(Duration::from_secs(60))
//!         .execute()
//!         .await?;
//!
//!     let features = Features::new().with("temp", 21.5);
//!     client.learn(&model_id, &features, 22.0).await?;
//!     let prediction = client.predict(&model_id, &features).await?;
//!     println!("prediction: {:?}", prediction.get("prediction"));
//!
//!     let metrics = client.get_metrics(&model_id).await?;
//!     println!("metrics: {:?}", metrics);
//!
//!     client.delete_model(&model_id).await?;
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`KappaClient`], its builder, and the deployment wait |
//! | [`config`] | One-shot configuration resolution (explicit > environment > default) |
//! | [`error`] | Error taxonomy |
//! | [`error_code`] | Classification of failed service responses |
//! | [`transport`] | HTTP session resource |
//! | [`types`] | Features, model types and status reports |

pub mod client;
pub mod config;
pub mod error;
pub mod error_code;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CreateModelRequest, KappaClient, KappaClientBuilder, SessionSignals};
pub use config::ClientConfig;
pub use error::{DeploymentFailure, Error, ErrorContext};
pub use error_code::ServiceErrorCode;
pub use tokio_util::sync::CancellationToken;
pub use transport::SessionState;
pub use types::{DeploymentState, FeatureValue, Features, JsonObject, MlType, ModelStatus};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
