//! End-to-end coverage of the six concrete scenarios over a real TCP
//! socket: a loaded actor answering a scalar call, a type mismatch, a DTO
//! round-trip, an unknown actor, runtime registration, and the reserved
//! name refusal.

use std::path::PathBuf;

use arpc_codec::{RespCodec, WireRequest};
use arpc_core::envelope::Envelope;
use arpc_server::{Server, ServerConfig};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_util::codec::Framed;

/// Builds the `greeter-actor` fixture as a separate `cargo` process rather
/// than depending on its crate from this test binary: a dev-dependency
/// would statically link the same `arpc-plugin`/`arpc-core` code this
/// binary also `dlopen`s from the resulting `cdylib`, and the dynamic
/// linker interposing symbols between those two copies is exactly the kind
/// of crash dynamic actor loading is supposed to stay clear of.
fn plugin_path() -> PathBuf {
    #[cfg(target_os = "macos")]
    const FILE: &str = "libgreeter_actor.dylib";
    #[cfg(target_os = "windows")]
    const FILE: &str = "greeter_actor.dll";
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    const FILE: &str = "libgreeter_actor.so";

    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
    let status = std::process::Command::new(env!("CARGO"))
        .args(["build", "-p", "greeter-actor"])
        .current_dir(&workspace_root)
        .status()
        .expect("failed to invoke cargo to build the greeter-actor fixture");
    assert!(status.success(), "building the greeter-actor fixture failed");

    let path = workspace_root.join("target/debug").join(FILE);
    assert!(path.exists(), "expected plugin fixture at {}", path.display());
    path
}

struct Harness {
    framed: Framed<TcpStream, RespCodec>,
    _shutdown_tx: watch::Sender<bool>,
}

impl Harness {
    async fn start(allow_register: bool, preload_greeter: bool) -> Self {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
            allow_register,
            manifest_path: None,
        };
        let server = Server::build(config).await;
        let listener = server.bind().await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            let _ = server.serve(listener, rx).await;
        });

        let stream = TcpStream::connect(addr).await.expect("connect");
        let mut framed = Framed::new(stream, RespCodec);

        if preload_greeter {
            let path = plugin_path().to_string_lossy().into_owned();
            let payload = json!({"args": ["greeter", path], "kwargs": {}}).to_string();
            let req = WireRequest {
                actor: "system".into(),
                method: "register_actor".into(),
                payload_json: Some(payload),
            };
            framed.send(req.to_resp()).await.expect("send registration");
            let resp = framed.next().await.expect("response").expect("frame");
            let envelope = decode(&resp);
            assert!(envelope.success, "failed to preload greeter: {envelope:?}");
        }

        Harness {
            framed,
            _shutdown_tx: tx,
        }
    }

    async fn call(&mut self, actor: &str, method: &str, payload: Option<serde_json::Value>) -> Envelope {
        let resp = self.call_raw(actor, method, payload).await;
        decode(&resp)
    }

    /// Returns the raw response frame, unparsed — for assertions that must
    /// see the literal wire bytes rather than round-trip through `Envelope`'s
    /// own `Deserialize` impl.
    async fn call_raw(&mut self, actor: &str, method: &str, payload: Option<serde_json::Value>) -> arpc_codec::Resp {
        let req = WireRequest {
            actor: actor.into(),
            method: method.into(),
            payload_json: payload.map(|p| p.to_string()),
        };
        self.framed.send(req.to_resp()).await.expect("send");
        self.framed.next().await.expect("response").expect("frame")
    }
}

fn decode(resp: &arpc_codec::Resp) -> Envelope {
    let text = arpc_codec::decode_response(resp).expect("bulk string");
    serde_json::from_str(text).expect("valid envelope json")
}

#[tokio::test]
async fn scenario_1_arithmetic_call() {
    let mut h = Harness::start(true, true).await;
    let envelope = h
        .call("greeter", "add_two_ints", Some(json!({"args": [1, 2], "kwargs": {}})))
        .await;
    assert!(envelope.success);
    assert_eq!(envelope.result, json!(3));
    assert_eq!(envelope.error, None);
    assert_eq!(envelope.error_type, None);
}

#[tokio::test]
async fn scenario_2_type_mismatch() {
    let mut h = Harness::start(true, true).await;
    let resp = h
        .call_raw("greeter", "add_two_ints", Some(json!({"args": ["a", 2], "kwargs": {}})))
        .await;
    let raw = arpc_codec::decode_response(&resp).expect("bulk string");
    assert!(
        raw.contains(r#""error_type":1"#),
        "error_type must be the numeric wire code 1, not a string: {raw}"
    );

    let envelope: Envelope = serde_json::from_str(raw).expect("valid envelope json");
    assert!(!envelope.success);
    assert_eq!(
        envelope.error.as_deref(),
        Some("parameter (x) supposed to be of type (int), but found (str)")
    );
    assert_eq!(envelope.error_type, Some(arpc_core::error::ErrorKind::BadRequest));
}

#[tokio::test]
async fn scenario_3_dto_round_trip() {
    let mut h = Harness::start(true, true).await;
    let envelope = h
        .call("greeter", "modify", Some(json!({"args": [{"attr": 0}, 7], "kwargs": {}})))
        .await;
    assert!(envelope.success);
    assert_eq!(envelope.result, json!({"attr": 7}));
}

#[tokio::test]
async fn scenario_4_unknown_actor() {
    let mut h = Harness::start(false, false).await;
    let envelope = h.call("nobody", "x", Some(json!({"args": [], "kwargs": {}}))).await;
    assert!(!envelope.success);
    assert_eq!(envelope.error.as_deref(), Some("actor not found"));
    assert_eq!(envelope.error_type, Some(arpc_core::error::ErrorKind::ActorError));
}

#[tokio::test]
async fn scenario_5_registration_round_trip() {
    let mut h = Harness::start(true, false).await;
    let path = plugin_path().to_string_lossy().into_owned();

    let envelope = h
        .call(
            "system",
            "register_actor",
            Some(json!({"args": ["a1", path], "kwargs": {}})),
        )
        .await;
    assert!(envelope.success);
    assert_eq!(envelope.result, json!(true));

    let listing = h.call("core", "list_actors", None).await;
    assert!(listing.result.as_array().expect("array").iter().any(|v| v.as_str() == Some("a1")));

    let envelope = h
        .call("system", "unregister_actor", Some(json!({"args": ["a1"], "kwargs": {}})))
        .await;
    assert!(envelope.success);
    assert_eq!(envelope.result, json!(true));

    let listing = h.call("core", "list_actors", None).await;
    assert!(!listing.result.as_array().expect("array").iter().any(|v| v.as_str() == Some("a1")));
}

#[tokio::test]
async fn scenario_6_reserved_name_refused() {
    let mut h = Harness::start(true, false).await;
    let envelope = h
        .call(
            "system",
            "register_actor",
            Some(json!({"args": ["core", "/tmp/whatever.so"], "kwargs": {}})),
        )
        .await;
    assert!(!envelope.success);
    assert_eq!(envelope.error_type, Some(arpc_core::error::ErrorKind::BadRequest));

    let listing = h.call("core", "list_actors", None).await;
    assert!(listing.result.as_array().expect("array").iter().any(|v| v.as_str() == Some("core")));
}

#[tokio::test]
async fn requests_on_one_connection_are_answered_in_arrival_order() {
    let mut h = Harness::start(true, true).await;
    for i in 0..5 {
        let envelope = h
            .call("greeter", "add_two_ints", Some(json!({"args": [i, 1], "kwargs": {}})))
            .await;
        assert_eq!(envelope.result, json!(i + 1));
    }
}

#[tokio::test]
async fn shutdown_drains_an_in_flight_connection_instead_of_severing_it() {
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
        allow_register: true,
        manifest_path: None,
    };
    let server = Server::build(config).await;
    let listener = server.bind().await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let (tx, rx) = watch::channel(false);
    let serve_task = tokio::spawn(async move { server.serve(listener, rx).await });

    let stream = TcpStream::connect(addr).await.expect("connect");
    let mut framed = Framed::new(stream, RespCodec);

    let path = plugin_path().to_string_lossy().into_owned();
    let req = WireRequest {
        actor: "system".into(),
        method: "register_actor".into(),
        payload_json: Some(json!({"args": ["greeter", path], "kwargs": {}}).to_string()),
    };
    framed.send(req.to_resp()).await.expect("send registration");
    let resp = framed.next().await.expect("response").expect("frame");
    assert!(decode(&resp).success, "failed to preload greeter");

    // Signal shutdown with this connection still open, then send one more
    // request on it: the connection must still be served to completion, not
    // dropped mid-dispatch.
    tx.send(true).expect("send shutdown signal");

    let req = WireRequest {
        actor: "greeter".into(),
        method: "add_two_ints".into(),
        payload_json: Some(json!({"args": [1, 2], "kwargs": {}}).to_string()),
    };
    framed.send(req.to_resp()).await.expect("send");
    let resp = framed.next().await.expect("response").expect("frame");
    let envelope = decode(&resp);
    assert!(envelope.success, "in-flight request must be answered, not severed, during shutdown: {envelope:?}");
    assert_eq!(envelope.result, json!(3));

    drop(framed);
    tokio::time::timeout(std::time::Duration::from_secs(5), serve_task)
        .await
        .expect("serve() must return once its connections drain")
        .expect("serve task panicked")
        .expect("serve() returned an error");
}
