//! Feature payloads for predict and learn calls.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A numeric or string value. Used both for features and for learn targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    /// Non-finite floats cannot be encoded as JSON numbers.
    pub fn is_finite(&self) -> bool {
        match self {
            FeatureValue::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Integer(i) => Some(*i as f64),
            FeatureValue::Float(f) => Some(*f),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn ensure_finite(&self, field: &str) -> Result<()> {
        if self.is_finite() {
            return Ok(());
        }
        Err(Error::validation_with_context(
            "numeric values must be finite",
            ErrorContext::new()
                .with_field_path(field.to_string())
                .with_details(self.to_string()),
        ))
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Integer(i) => write!(f, "{}", i),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Text(s) => write!(f, "{}", s),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for FeatureValue {
            fn from(v: $t) -> Self {
                FeatureValue::Integer(i64::from(v))
            }
        })*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

// Values beyond `i64::MAX` are sent as floats and may lose precision.
macro_rules! impl_from_wide_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for FeatureValue {
            fn from(v: $t) -> Self {
                i64::try_from(v).map_or(FeatureValue::Float(v as f64), FeatureValue::Integer)
            }
        })*
    };
}

impl_from_wide_unsigned!(u64, usize);

impl From<f32> for FeatureValue {
    fn from(v: f32) -> Self {
        FeatureValue::Float(f64::from(v))
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

/// Mapping from feature name to value, passed through to the service as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Features(BTreeMap<String, FeatureValue>);

impl Features {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a value, returning the previous one for that name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FeatureValue>,
    ) -> Option<FeatureValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.0.iter()
    }

    pub(crate) fn ensure_finite(&self) -> Result<()> {
        for (name, value) in &self.0 {
            value.ensure_finite(&format!("features.{}", name))?;
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for Features
where
    K: Into<String>,
    V: Into<FeatureValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_as_plain_object() {
        let features = Features::new()
            .with("temp", 21.5)
            .with("count", 3)
            .with("room", "kitchen");
        assert_eq!(
            serde_json::to_value(&features).unwrap(),
            json!({"temp": 21.5, "count": 3, "room": "kitchen"})
        );
    }

    #[test]
    fn test_untagged_deserialize_keeps_integers() {
        let features: Features =
            serde_json::from_value(json!({"a": 1, "b": 2.5, "c": "x"})).unwrap();
        assert_eq!(features.get("a"), Some(&FeatureValue::Integer(1)));
        assert_eq!(features.get("b"), Some(&FeatureValue::Float(2.5)));
        assert_eq!(features.get("c").and_then(|v| v.as_str()), Some("x"));
    }

    #[test]
    fn test_wide_unsigned_conversions() {
        let readings = vec![20.5, 21.0, 21.5];
        let features = Features::new().with("samples", readings.len()).with("ts", 1_700_000_000u64);
        assert_eq!(features.get("samples"), Some(&FeatureValue::Integer(3)));
        assert_eq!(features.get("ts"), Some(&FeatureValue::Integer(1_700_000_000)));

        let huge = FeatureValue::from(u64::MAX);
        assert!(matches!(huge, FeatureValue::Float(_)));
        assert_eq!(huge.as_f64(), Some(u64::MAX as f64));
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(FeatureValue::from(3).as_f64(), Some(3.0));
        assert_eq!(FeatureValue::from(2.5).as_f64(), Some(2.5));
        assert_eq!(FeatureValue::from("spam").as_f64(), None);
        assert_eq!(FeatureValue::from("spam").as_str(), Some("spam"));
    }

    #[test]
    fn test_non_finite_rejected() {
        let features: Features = [("ok", 1.0), ("bad", f64::NAN)].into_iter().collect();
        let err = features.ensure_finite().unwrap_err();
        assert!(err.is_usage());
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("features.bad")
        );
    }
}
