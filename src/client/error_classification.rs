//! Translation of HTTP outcomes into [`Error`] values.

use crate::error_code::ServiceErrorCode;
use crate::transport::RawResponse;
use crate::types::JsonObject;
use crate::{Error, ErrorContext, Result};
use serde_json::Value;
use tracing::warn;

const MAX_RAW_MESSAGE_CHARS: usize = 512;

/// Client operations, used to label errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    CreateModel,
    GetModelStatus,
    Predict,
    Learn,
    GetMetrics,
    DeleteModel,
}

impl Operation {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Operation::CreateModel => "create_model",
            Operation::GetModelStatus => "get_model_status",
            Operation::Predict => "predict",
            Operation::Learn => "learn",
            Operation::GetMetrics => "get_metrics",
            Operation::DeleteModel => "delete_model",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::CreateModel => "Failed to create model",
            Operation::GetModelStatus => "Failed to get model status",
            Operation::Predict => "Failed to get prediction",
            Operation::Learn => "Failed to learn",
            Operation::GetMetrics => "Failed to get metrics",
            Operation::DeleteModel => "Failed to delete model",
        }
    }
}

/// Passes 2xx responses through and classifies everything else.
///
/// `model_id` is set for model-scoped operations; a 404 on those becomes
/// [`Error::ModelNotFound`].
pub(crate) fn ensure_success(
    op: Operation,
    model_id: Option<&str>,
    resp: RawResponse,
) -> Result<RawResponse> {
    if resp.status.is_success() {
        return Ok(resp);
    }
    Err(classify_failure(op, model_id, &resp))
}

pub(crate) fn classify_failure(op: Operation, model_id: Option<&str>, resp: &RawResponse) -> Error {
    let status = resp.status.as_u16();

    if status == 404 {
        if let Some(id) = model_id {
            return Error::ModelNotFound {
                model_id: id.to_string(),
            };
        }
    }

    let (service_code, message) = extract_service_error(&resp.body);
    let message = message.unwrap_or_else(|| {
        resp.status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    });
    let code = ServiceErrorCode::classify(status, service_code.as_deref());

    warn!(
        operation = op.name(),
        status,
        code = code.name(),
        request_id = %resp.request_id,
        "request failed"
    );

    Error::Remote {
        status,
        code,
        service_code,
        message: format!("{}: {}", op.failure_prefix(), message),
        request_id: Some(resp.request_id.clone()),
    }
}

/// Pulls `(code, message)` out of an error body.
///
/// Recognizes `{"detail": ...}`, `{"message": ...}`, `{"error": "..."}` and
/// `{"error": {"message": ..., "code": ...}}`; anything else is returned as
/// truncated raw text.
pub(crate) fn extract_service_error(body: &str) -> (Option<String>, Option<String>) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, None);
    }

    let json: Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(_) => return (None, Some(truncate(trimmed))),
    };

    let nested = json.get("error").filter(|e| e.is_object());
    let code = json
        .get("code")
        .or_else(|| nested.and_then(|e| e.get("code")))
        .and_then(value_text);

    let message = json
        .get("detail")
        .or_else(|| json.get("message"))
        .or_else(|| nested.and_then(|e| e.get("message")))
        .or_else(|| json.get("error").filter(|e| e.is_string()))
        .and_then(value_text)
        .unwrap_or_else(|| truncate(trimmed));

    (code, Some(message))
}

fn value_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_RAW_MESSAGE_CHARS {
        return s.to_string();
    }
    let mut out: String = s.chars().take(MAX_RAW_MESSAGE_CHARS).collect();
    out.push('…');
    out
}

/// Decodes a success body that must be a JSON object.
pub(crate) fn decode_object(op: Operation, resp: &RawResponse) -> Result<JsonObject> {
    let value: Value = serde_json::from_str(&resp.body)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::unexpected_response(
            format!("{} expected a JSON object", op.name()),
            ErrorContext::new()
                .with_details(format!("got {}", json_kind(&other)))
                .with_source(op.name()),
        )),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
