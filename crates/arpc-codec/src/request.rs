use crate::resp::Resp;

/// A decoded wire request: `["<actor>", "<method>", "<payload_json>"]`, with
/// the third element omitted for zero-argument calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WireRequest {
    pub actor: String,
    pub method: String,
    /// Raw JSON text of `{"args": [...], "kwargs": {...}}`, absent for
    /// zero-arg calls.
    pub payload_json: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("expected a RESP array")]
    NotAnArray,
    #[error("request array must hold 2 or 3 bulk strings, got {0}")]
    WrongArity(usize),
    #[error("request array elements must be bulk strings")]
    NotBulkStrings,
    #[error("bulk string was not valid UTF-8")]
    InvalidUtf8,
}

impl WireRequest {
    /// Extracts a [`WireRequest`] from a decoded [`Resp`] value.
    pub fn from_resp(value: &Resp) -> Result<Self, RequestError> {
        let Resp::Array(Some(items)) = value else {
            return Err(RequestError::NotAnArray);
        };
        if items.len() != 2 && items.len() != 3 {
            return Err(RequestError::WrongArity(items.len()));
        }
        let mut strings = items.iter().map(|item| {
            item.as_bulk()
                .ok_or(RequestError::NotBulkStrings)
                .and_then(|bytes| {
                    std::str::from_utf8(bytes)
                        .map(str::to_owned)
                        .map_err(|_| RequestError::InvalidUtf8)
                })
        });
        let actor = strings.next().expect("checked arity")?;
        let method = strings.next().expect("checked arity")?;
        let payload_json = strings.next().transpose()?;
        Ok(WireRequest {
            actor,
            method,
            payload_json,
        })
    }

    /// Encodes this request as the RESP array the wire expects.
    #[must_use]
    pub fn to_resp(&self) -> Resp {
        let mut items = vec![Resp::bulk(self.actor.clone()), Resp::bulk(self.method.clone())];
        if let Some(payload) = &self.payload_json {
            items.push(Resp::bulk(payload.clone()));
        }
        Resp::Array(Some(items))
    }
}

/// Wraps a JSON-encoded response envelope as the single RESP bulk string
/// the wire sends back.
#[must_use]
pub fn encode_response(envelope_json: &str) -> Resp {
    Resp::bulk(envelope_json.to_owned())
}

/// Extracts the JSON text of a response envelope from a decoded [`Resp`]
/// bulk string.
pub fn decode_response(value: &Resp) -> Result<&str, RequestError> {
    let bytes = value.as_bulk().ok_or(RequestError::NotBulkStrings)?;
    std::str::from_utf8(bytes).map_err(|_| RequestError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_zero_arg_request() {
        let req = WireRequest {
            actor: "core".into(),
            method: "list_actors".into(),
            payload_json: None,
        };
        let resp = req.to_resp();
        assert_eq!(WireRequest::from_resp(&resp).expect("parses"), req);
    }

    #[test]
    fn round_trips_a_request_with_payload() {
        let req = WireRequest {
            actor: "greeter".into(),
            method: "add_two_ints".into(),
            payload_json: Some(r#"{"args":[1,2],"kwargs":{}}"#.into()),
        };
        let resp = req.to_resp();
        assert_eq!(WireRequest::from_resp(&resp).expect("parses"), req);
    }

    #[test]
    fn rejects_wrong_arity() {
        let resp = Resp::Array(Some(vec![Resp::bulk("only_one")]));
        assert_eq!(
            WireRequest::from_resp(&resp),
            Err(RequestError::WrongArity(1))
        );
    }

    #[test]
    fn rejects_non_array() {
        assert_eq!(
            WireRequest::from_resp(&Resp::Integer(1)),
            Err(RequestError::NotAnArray)
        );
    }
}
