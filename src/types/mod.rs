//! # Types Module
//!
//! Strongly-typed representations of the values exchanged with the KappaML API.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MlType`] | Learning task of a model (regression or classification) |
//! | [`Features`] | Named feature values sent to predict/learn |
//! | [`FeatureValue`] | A single numeric or string value (also used for learn targets) |
//! | [`ModelStatus`] | Parsed status report of a model |
//! | [`DeploymentState`] | States of the deployment-wait state machine |
//! | [`JsonObject`] | Verbatim JSON object returned by predict/learn/metrics |
//!
//! ## Example
//!
//! ```rust
//! use kappaml::types::{Features, MlType};
//!
//! let features = Features::new().with("temp", 21.5).with("room", "kitchen");
//! assert_eq!(features.len(), 2);
//!
//! let ml_type: MlType = "regression".parse().unwrap();
//! assert_eq!(ml_type, MlType::Regression);
//! ```

pub mod features;
pub mod model;

pub use features::{FeatureValue, Features};
pub use model::{CreatedModel, DeploymentState, JsonObject, MlType, ModelStatus};
