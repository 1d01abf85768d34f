#![forbid(clippy::unwrap_used)]

//! Connection, actor discovery, and a typed call proxy for the arpc wire
//! protocol (C8).
//!
//! On connect, the client calls `core.list_actors` and then `<actor>.info`
//! for each name, building a local `actors_proxy` table (§3). Every call
//! after that goes through [`Client::call`] (untyped, returning raw JSON)
//! or [`ActorProxy::call_as`] (typed, via `serde::de::DeserializeOwned`):
//! since this client's DTOs are plain JSON objects on the wire, a caller
//! that has the corresponding Rust type gets reconstruction for free
//! through `serde`, without needing to `dlopen` the actor's module the way
//! a dynamically-typed client would. Callers without that type still get
//! the raw mapping back, matching §4.8's "surfaced as raw mappings"
//! fallback.

use std::collections::HashMap;
use std::net::SocketAddr;

use arpc_codec::{decode_response, RespCodec, WireRequest};
use arpc_core::envelope::{Envelope, Payload};
use arpc_core::error::RemoteError;
use arpc_core::method::ActorInfo;
use arpc_core::CORE_ACTOR;
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request encoding error: {0}")]
    Request(#[from] arpc_codec::RequestError),
    #[error("framing error: {0}")]
    Frame(#[from] arpc_codec::FrameError),
    #[error("malformed response envelope: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("connection closed by peer")]
    ConnectionClosed,
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("no such actor `{0}` (call reload() to refresh discovery)")]
    UnknownActor(String),
}

/// A connection to one arpc server, with a locally cached actor table
/// refreshed at connect time and on [`Client::reload`].
pub struct Client {
    framed: Framed<TcpStream, RespCodec>,
    actors: HashMap<String, ActorInfo>,
}

impl Client {
    /// Connects to `addr` and runs discovery (`core.list_actors` then
    /// `<actor>.info` for each name) before returning.
    #[instrument(skip_all, fields(addr = %addr))]
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let mut client = Self {
            framed: Framed::new(stream, RespCodec),
            actors: HashMap::new(),
        };
        client.reload().await?;
        Ok(client)
    }

    /// Re-runs discovery, replacing the cached actor table in place.
    pub async fn reload(&mut self) -> Result<(), ClientError> {
        let names: Vec<String> = self.call_typed(CORE_ACTOR, "list_actors", Payload::default()).await?;
        let mut actors = HashMap::with_capacity(names.len());
        for name in names {
            let mut payload = Payload::default();
            payload.args.push(Value::from(name.clone()));
            let info: ActorInfo = self.call_typed(CORE_ACTOR, "info", payload).await?;
            actors.insert(name, info);
        }
        self.actors = actors;
        Ok(())
    }

    /// The actor table built by the last [`Client::connect`] or
    /// [`Client::reload`].
    #[must_use]
    pub fn actors(&self) -> &HashMap<String, ActorInfo> {
        &self.actors
    }

    /// Borrows a proxy for `name`, or `None` if discovery never saw it
    /// (stale after another client registered an actor; call
    /// [`Client::reload`] first).
    pub fn actor(&mut self, name: &str) -> Option<ActorProxy<'_>> {
        let info = self.actors.get(name)?.clone();
        Some(ActorProxy { client: self, info })
    }

    /// Calls `actor.method(args, kwargs)` and returns the raw result value,
    /// without requiring `actor` to be in the discovered table — used for
    /// `core`/`system` calls and by [`ActorProxy::call`].
    pub async fn call(&mut self, actor: &str, method: &str, payload: Payload) -> Result<Value, ClientError> {
        let payload_json = Some(serde_json::to_string(&payload)?);
        let request = WireRequest {
            actor: actor.to_string(),
            method: method.to_string(),
            payload_json,
        };
        self.framed.send(request.to_resp()).await?;
        let resp = self.framed.next().await.ok_or(ClientError::ConnectionClosed)??;
        let text = decode_response(&resp)?;
        let envelope: Envelope = serde_json::from_str(text)?;
        if envelope.success {
            Ok(envelope.result)
        } else {
            let kind = envelope.error_type.unwrap_or(arpc_core::error::ErrorKind::InternalServerError);
            Err(ClientError::Remote(RemoteError::new(kind, envelope.error.unwrap_or_default())))
        }
    }

    async fn call_typed<T: DeserializeOwned>(&mut self, actor: &str, method: &str, payload: Payload) -> Result<T, ClientError> {
        let value = self.call(actor, method, payload).await?;
        Ok(serde_json::from_value(value)?)
    }
}

/// A handle bound to one discovered actor, carrying its cached
/// [`ActorInfo`] so callers can inspect the method table without another
/// round trip.
pub struct ActorProxy<'a> {
    client: &'a mut Client,
    info: ActorInfo,
}

impl ActorProxy<'_> {
    #[must_use]
    pub fn info(&self) -> &ActorInfo {
        &self.info
    }

    /// Calls `method` and returns the raw JSON result.
    pub async fn call(&mut self, method: &str, args: Vec<Value>, kwargs: serde_json::Map<String, Value>) -> Result<Value, ClientError> {
        self.client.call(&self.info.name, method, Payload { args, kwargs }).await
    }

    /// Calls `method` and deserializes the result into `T`. A DTO result
    /// round-trips through `serde` the same way it round-trips through the
    /// actor's `Dto::from_mapping`/`to_mapping` on the server.
    pub async fn call_as<T: DeserializeOwned>(
        &mut self,
        method: &str,
        args: Vec<Value>,
        kwargs: serde_json::Map<String, Value>,
    ) -> Result<T, ClientError> {
        let value = self.call(method, args, kwargs).await?;
        Ok(serde_json::from_value(value)?)
    }
}
