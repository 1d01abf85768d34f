use std::sync::Arc;

use arpc_codec::{encode_response, FrameError, RespCodec, WireRequest};
use arpc_core::envelope::Payload;
use arpc_core::error::{ErrorKind, RemoteError};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::instrument;

use crate::dispatch::Dispatcher;

/// Serves one accepted connection until the peer closes it or framing
/// breaks (§4.7). Requests are handled strictly in order: the next frame
/// is not read until the current response has been written.
#[instrument(skip(stream, dispatcher), fields(peer = %peer_addr))]
pub async fn serve_connection(stream: TcpStream, peer_addr: std::net::SocketAddr, dispatcher: Arc<Dispatcher>) {
    let mut framed = Framed::new(stream, RespCodec);

    loop {
        let frame = match framed.next().await {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "closing connection after a framing error");
                return;
            }
            None => return,
        };

        let request = match WireRequest::from_resp(&frame) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "closing connection after a malformed request");
                return;
            }
        };

        let payload = match parse_payload(request.payload_json.as_deref()) {
            Ok(payload) => payload,
            Err(remote) => {
                if write_envelope(&mut framed, &remote_to_envelope_json(&remote)).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let envelope = dispatcher.dispatch(&request.actor, &request.method, &payload).await;
        let envelope_json = match serde_json::to_string(&envelope) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response envelope");
                return;
            }
        };

        if write_envelope(&mut framed, &envelope_json).await.is_err() {
            return;
        }
    }
}

fn parse_payload(payload_json: Option<&str>) -> Result<Payload, RemoteError> {
    match payload_json {
        None => Ok(Payload::default()),
        Some(text) => serde_json::from_str(text)
            .map_err(|e| RemoteError::bad_request(format!("malformed request payload: {e}"))),
    }
}

fn remote_to_envelope_json(remote: &RemoteError) -> String {
    let envelope = arpc_core::envelope::Envelope::err(remote.kind, remote.message.clone());
    // A well-formed `Envelope` always serializes; a failure here would be a
    // dispatcher defect, not something the caller can act on.
    serde_json::to_string(&envelope).unwrap_or_else(|_| {
        format!(
            r#"{{"success":false,"result":null,"error":"internal encoding failure","error_type":{}}}"#,
            ErrorKind::InternalServerError.code()
        )
    })
}

async fn write_envelope(
    framed: &mut Framed<TcpStream, RespCodec>,
    envelope_json: &str,
) -> Result<(), FrameError> {
    framed.send(encode_response(envelope_json)).await
}
