#![forbid(clippy::unwrap_used)]

//! The actor registry, dispatcher, built-in system actors, and connection
//! server (C5-C7): everything that turns an accepted TCP connection into
//! dispatched, RESP-framed request/response pairs.

pub mod builtin;
pub mod conn;
pub mod dispatch;
pub mod registry;
pub mod server;

pub use dispatch::Dispatcher;
pub use registry::{RegisterError, Registry};
pub use server::{Server, ServerConfig, DEFAULT_ADDR};
