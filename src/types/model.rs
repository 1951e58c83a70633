//! Model descriptors and status reports.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// JSON object returned verbatim by predict, learn and metrics calls.
pub type JsonObject = serde_json::Map<String, Value>;

/// Learning task of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MlType {
    Regression,
    Classification,
}

impl MlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MlType::Regression => "regression",
            MlType::Classification => "classification",
        }
    }
}

impl fmt::Display for MlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MlType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "regression" => Ok(MlType::Regression),
            "classification" => Ok(MlType::Classification),
            _ => Err(Error::validation_with_context(
                format!("unsupported ml_type '{}'", s),
                ErrorContext::new()
                    .with_field_path("ml_type")
                    .with_details("expected 'regression' or 'classification'"),
            )),
        }
    }
}

/// States of the deployment-wait state machine.
///
/// The service only ever reports `Pending`, `Deployed` or `Failed`; `TimedOut`
/// is reached locally when the wait deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentState {
    Pending,
    Deployed,
    Failed,
    TimedOut,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentState::Pending)
    }
}

/// Status report for a model as returned by `GET /models/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStatus {
    pub model_id: String,
    /// Raw status string reported by the service (e.g. `"Deployed"`).
    pub status: String,
    pub state: DeploymentState,
    /// Set when the report carried both deployed and failed signals.
    /// Such reports resolve to `Failed`.
    pub ambiguous: bool,
}

impl ModelStatus {
    pub fn from_response(model_id: &str, body: &JsonObject) -> Result<Self> {
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::unexpected_response(
                    "status response is missing a string `status` field",
                    ErrorContext::new()
                        .with_field_path("status")
                        .with_details(format!("model {}", model_id)),
                )
            })?
            .to_string();

        let normalized = status.trim().to_ascii_lowercase();
        let failed_flag = body.get("failed").and_then(Value::as_bool) == Some(true);
        let error_flag = match body.get("error") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        let deployed_flag = body.get("deployed").and_then(Value::as_bool) == Some(true);

        let says_failed = matches!(normalized.as_str(), "failed" | "error") || failed_flag || error_flag;
        let says_deployed = normalized == "deployed" || deployed_flag;

        let state = if says_failed {
            DeploymentState::Failed
        } else if says_deployed {
            DeploymentState::Deployed
        } else {
            DeploymentState::Pending
        };

        Ok(Self {
            model_id: model_id.to_string(),
            status,
            state,
            ambiguous: says_failed && says_deployed,
        })
    }

    pub fn is_deployed(&self) -> bool {
        self.state == DeploymentState::Deployed
    }

    pub fn is_failed(&self) -> bool {
        self.state == DeploymentState::Failed
    }
}

/// Result of `POST /models`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedModel {
    pub id: String,
    /// Initial status, if the service reported one.
    pub status: Option<String>,
}

impl CreatedModel {
    pub fn from_response(body: &JsonObject) -> Result<Self> {
        let id = match body.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::unexpected_response(
                    "create response is missing a model `id`",
                    ErrorContext::new().with_field_path("id"),
                ))
            }
        };
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Self { id, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> JsonObject {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_ml_type_parsing() {
        assert_eq!("Regression".parse::<MlType>().unwrap(), MlType::Regression);
        assert_eq!(
            " classification ".parse::<MlType>().unwrap(),
            MlType::Classification
        );
        let err = "clustering".parse::<MlType>().unwrap_err();
        assert!(err.is_usage());
        assert_eq!(serde_json::to_value(MlType::Regression).unwrap(), json!("regression"));
    }

    #[test]
    fn test_status_strings() {
        let cases = [
            ("Deployed", DeploymentState::Deployed),
            ("deployed", DeploymentState::Deployed),
            ("Failed", DeploymentState::Failed),
            ("Pending", DeploymentState::Pending),
            ("Deploying", DeploymentState::Pending),
        ];
        for (raw, expected) in cases {
            let st = ModelStatus::from_response("m", &obj(json!({"status": raw}))).unwrap();
            assert_eq!(st.state, expected, "status {}", raw);
            assert_eq!(st.state.is_terminal(), expected != DeploymentState::Pending);
            assert_eq!(st.status, raw);
            assert!(!st.ambiguous);
        }
    }

    #[test]
    fn test_ambiguous_status_fails_closed() {
        let st = ModelStatus::from_response(
            "m",
            &obj(json!({"status": "Deployed", "error": "container crashed"})),
        )
        .unwrap();
        assert_eq!(st.state, DeploymentState::Failed);
        assert!(st.ambiguous);

        let st = ModelStatus::from_response(
            "m",
            &obj(json!({"status": "Failed", "deployed": true})),
        )
        .unwrap();
        assert!(st.is_failed());
        assert!(st.ambiguous);

        let st = ModelStatus::from_response("m", &obj(json!({"status": "Deployed", "error": null})))
            .unwrap();
        assert!(st.is_deployed());
    }

    #[test]
    fn test_only_pending_is_non_terminal() {
        assert!(!DeploymentState::Pending.is_terminal());
        assert!(DeploymentState::Deployed.is_terminal());
        assert!(DeploymentState::Failed.is_terminal());
        assert!(DeploymentState::TimedOut.is_terminal());
    }

    #[test]
    fn test_missing_status_is_unexpected_response() {
        let err = ModelStatus::from_response("m", &obj(json!({"state": "Deployed"}))).unwrap_err();
        assert!(matches!(err, Error::UnexpectedResponse { .. }));
        assert!(err.is_sdk());
    }

    #[test]
    fn test_created_model_id_forms() {
        let created =
            CreatedModel::from_response(&obj(json!({"id": "abc", "status": "Pending"}))).unwrap();
        assert_eq!(created.id, "abc");
        assert_eq!(created.status.as_deref(), Some("Pending"));

        let created = CreatedModel::from_response(&obj(json!({"id": 42}))).unwrap();
        assert_eq!(created.id, "42");

        assert!(CreatedModel::from_response(&obj(json!({"id": ""}))).is_err());
        assert!(CreatedModel::from_response(&obj(json!({}))).is_err());
    }
}
