#![forbid(clippy::unwrap_used)]

//! The stable ABI actor plugins are built against.
//!
//! An actor module is a native `cdylib` linked against this crate. It
//! exports one `extern "C"` symbol, `arpc_actor_create`, created by the
//! [`export_actor!`] macro, which `arpc-runtime` loads with `libloading`
//! the same way the teacher's native capability-provider host loaded
//! `.so`/`.dylib` plugins via a `__capability_provider_create` symbol.
//!
//! Plugin and host must be built with the same compiler and `arpc-core`
//! version: the ABI is only as stable as the Rust types crossing it, a
//! documented limitation of this loading strategy rather than a gap to
//! paper over.

pub mod dto;

pub use arpc_core::tag::TypeTag;
pub use dto::{Dto, DtoRegistry};

use serde_json::Value;

/// Declares one method an actor exposes. The receiver is implicit; `params`
/// lists only the remaining positional/keyword parameters.
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub doc: &'static str,
    pub params: Vec<(&'static str, TypeTag)>,
    pub result_tag: TypeTag,
}

impl MethodDescriptor {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            doc: "",
            params: Vec::new(),
            result_tag: TypeTag::Null,
        }
    }

    #[must_use]
    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    #[must_use]
    pub fn param(mut self, name: &'static str, tag: TypeTag) -> Self {
        self.params.push((name, tag));
        self
    }

    #[must_use]
    pub fn returns(mut self, tag: TypeTag) -> Self {
        self.result_tag = tag;
        self
    }
}

/// A method-invocation failure raised from inside an actor method. The
/// runtime turns this into an `ACTOR_ERROR` response; it never propagates
/// to the accept loop or closes the connection.
#[derive(Clone, Debug)]
pub struct ActorFault(pub String);

impl ActorFault {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for ActorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ActorFault {}

/// A loaded actor instance. Implementors declare their method table once
/// via [`Actor::methods`] and dispatch by name in [`Actor::call`]; the
/// runtime's binder has already validated and coerced `args`/`kwargs`
/// against the declared [`MethodDescriptor`] before `call` runs.
pub trait Actor: Send + Sync {
    /// The method table this actor exposes.
    fn methods(&self) -> Vec<MethodDescriptor>;

    /// The DTO capability registry backing every `TypeTag::Dto` parameter
    /// or result this actor declares. The binder and serializer never see
    /// a native Rust DTO type; they round-trip JSON mappings through this
    /// registry instead.
    fn dto_registry(&self) -> &dto::DtoRegistry;

    /// Invokes `method` with `args` positionally bound and `kwargs` applied
    /// by name, already merged into one ordered JSON array by the binder.
    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, ActorFault>;
}

/// Defines the `extern "C"` constructor `arpc-runtime` looks up by symbol
/// name after `libloading::Library::new`.
///
/// # Safety of the generated code
/// The generated function is `unsafe extern "C"` and returns an owning raw
/// pointer; the loader takes it back with `Box::from_raw` immediately
/// after calling it, matching the construct/reclaim pairing the teacher's
/// native capability loader uses.
#[macro_export]
macro_rules! export_actor {
    ($ctor:expr) => {
        #[no_mangle]
        pub extern "C" fn arpc_actor_create() -> *mut dyn $crate::Actor {
            let actor: Box<dyn $crate::Actor> = Box::new($ctor);
            Box::into_raw(actor)
        }
    };
}
