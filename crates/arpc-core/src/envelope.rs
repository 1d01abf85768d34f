use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorKind;

/// The decoded request payload: `{"args": [...], "kwargs": {...}}`.
///
/// Absent for zero-argument calls, in which case [`Payload::default`]
/// (empty args, empty kwargs) applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: serde_json::Map<String, Value>,
}

/// The on-wire response envelope.
///
/// `success` is always derived from `error`/`error_type`, never trusted
/// independently: [`Envelope::ok`] and [`Envelope::err`] are the only ways
/// to construct one, so the invariant holds by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub result: Value,
    pub error: Option<String>,
    pub error_type: Option<ErrorKind>,
}

impl Envelope {
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self {
            success: true,
            result,
            error: None,
            error_type: None,
        }
    }

    #[must_use]
    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(message.into()),
            error_type: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_and_error_are_derived_together() {
        let ok = Envelope::ok(json!(3));
        assert!(ok.success);
        assert!(ok.error.is_none());
        assert!(ok.error_type.is_none());

        let bad = Envelope::err(ErrorKind::BadRequest, "nope");
        assert!(!bad.success);
        assert!(bad.error.is_some());
        assert!(bad.error_type.is_some());
    }

    #[test]
    fn payload_defaults_for_zero_args() {
        let p: Payload = serde_json::from_str("{}").expect("parses");
        assert!(p.args.is_empty());
        assert!(p.kwargs.is_empty());
    }
}
