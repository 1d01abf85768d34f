#![forbid(clippy::unwrap_used)]

//! RESP wire framing (C1): a parser for inbound RESP arrays of bulk
//! strings, an encoder for the full RESP value set, and the domain-level
//! mapping between `arpc` requests/responses and RESP values.

pub mod codec;
pub mod request;
pub mod resp;

pub use codec::RespCodec;
pub use request::{decode_response, encode_response, RequestError, WireRequest};
pub use resp::{FrameError, Resp};
