use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// The four-member error taxonomy carried on the wire as `error_type`.
///
/// `NotFound` is reserved for symmetry with the source project this
/// protocol was modeled on; no dispatcher path here emits it today.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorKind {
    NotFound = 0,
    BadRequest = 1,
    ActorError = 2,
    InternalServerError = 3,
}

impl ErrorKind {
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotFound),
            1 => Some(Self::BadRequest),
            2 => Some(Self::ActorError),
            3 => Some(Self::InternalServerError),
            _ => None,
        }
    }
}

/// `error_type` is `0|1|2|3` on the wire (spec.md §3/§6), not the variant
/// name — `#[repr(u8)]` alone has no effect on `serde`, so the numeric
/// mapping is implemented by hand here instead.
impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code).ok_or_else(|| de::Error::invalid_value(Unexpected::Unsigned(code as u64), &"0, 1, 2, or 3"))
    }
}

/// The error raised by a client when a call's envelope has `success: false`.
///
/// Carries the same `(error, error_type)` pair the wire sends, so callers
/// can match on [`ErrorKind`] or propagate with `?`.
#[derive(Clone, Debug, Error, Serialize, Deserialize)]
#[error("{message} ({kind:?})")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RemoteError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    #[must_use]
    pub fn actor_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ActorError, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_its_numeric_code_not_its_variant_name() {
        assert_eq!(serde_json::to_string(&ErrorKind::NotFound).expect("serializes"), "0");
        assert_eq!(serde_json::to_string(&ErrorKind::BadRequest).expect("serializes"), "1");
        assert_eq!(serde_json::to_string(&ErrorKind::ActorError).expect("serializes"), "2");
        assert_eq!(serde_json::to_string(&ErrorKind::InternalServerError).expect("serializes"), "3");
    }

    #[test]
    fn round_trips_through_its_numeric_code() {
        for kind in [ErrorKind::NotFound, ErrorKind::BadRequest, ErrorKind::ActorError, ErrorKind::InternalServerError] {
            let wire = serde_json::to_string(&kind).expect("serializes");
            let back: ErrorKind = serde_json::from_str(&wire).expect("deserializes");
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn rejects_an_out_of_range_code() {
        assert!(serde_json::from_str::<ErrorKind>("4").is_err());
    }
}
