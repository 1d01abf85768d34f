#![forbid(clippy::unwrap_used)]

//! Shared types for the arpc wire protocol: actor descriptors, the scalar
//! type tag domain, the response envelope, and the error taxonomy.
//!
//! These types are depended on by the codec, the runtime (loader/binder),
//! the server, and the client, so that all four agree on one wire shape.

pub mod envelope;
pub mod error;
pub mod manifest;
pub mod method;
pub mod tag;

pub use envelope::{Envelope, Payload};
pub use error::{ErrorKind, RemoteError};
pub use manifest::ActorManifest;
pub use method::{ActorInfo, MethodInfo};
pub use tag::TypeTag;

/// Identifier reserved for the built-in introspection actor.
pub const CORE_ACTOR: &str = "core";

/// Identifier reserved for the built-in runtime-registration actor.
pub const SYSTEM_ACTOR: &str = "system";

/// True if `name` is reserved for a built-in actor and cannot be used for a
/// user-registered one.
#[must_use]
pub fn is_reserved_actor_name(name: &str) -> bool {
    name == CORE_ACTOR || name == SYSTEM_ACTOR
}

/// True if `name` is a valid actor or method identifier: non-empty, starts
/// with an ASCII letter or underscore, and contains only alphanumerics and
/// underscores thereafter.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_names() {
        assert!(is_reserved_actor_name("core"));
        assert!(is_reserved_actor_name("system"));
        assert!(!is_reserved_actor_name("greeter"));
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("greeter"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("add_two_ints"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1greeter"));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("has-dash"));
    }
}
