use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use arpc_core::envelope::{Envelope, Payload};
use arpc_core::error::RemoteError;
use arpc_core::{CORE_ACTOR, SYSTEM_ACTOR};
use arpc_runtime::{bind, serialize};
use futures::FutureExt;
use serde_json::Value;
use tracing::instrument;

use crate::builtin;
use crate::registry::Registry;

/// Resolves a call against the built-in actors or the loaded-actor table
/// and turns it into a response [`Envelope`] (§4.5).
///
/// `success` is derived, never trusted: the only way out of [`Dispatcher::dispatch`]
/// is through [`Envelope::ok`] or [`Envelope::err`].
pub struct Dispatcher {
    registry: Arc<Registry>,
    allow_register: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<Registry>, allow_register: bool) -> Self {
        Self {
            registry,
            allow_register,
        }
    }

    #[instrument(skip(self, payload), fields(actor = actor_name, method = method_name))]
    pub async fn dispatch(&self, actor_name: &str, method_name: &str, payload: &Payload) -> Envelope {
        let outcome = AssertUnwindSafe(self.dispatch_inner(actor_name, method_name, payload))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(value)) => Envelope::ok(value),
            Ok(Err(remote)) => Envelope::err(remote.kind, remote.message),
            Err(panic) => {
                let message = panic_message(&panic);
                tracing::error!(actor = actor_name, method = method_name, %message, "dispatcher defect");
                Envelope::err(
                    arpc_core::error::ErrorKind::InternalServerError,
                    format!("internal dispatcher defect: {message}"),
                )
            }
        }
    }

    async fn dispatch_inner(&self, actor_name: &str, method_name: &str, payload: &Payload) -> Result<Value, RemoteError> {
        if actor_name == CORE_ACTOR {
            return builtin::call_core(&self.registry, method_name, payload, self.allow_register).await;
        }
        if actor_name == SYSTEM_ACTOR {
            if !self.allow_register {
                return Err(RemoteError::actor_error("actor not found"));
            }
            return builtin::call_system(&self.registry, method_name, payload).await;
        }

        let (info, actor) = self
            .registry
            .get(actor_name)
            .await
            .ok_or_else(|| RemoteError::actor_error("actor not found"))?;
        let method = info
            .method(method_name)
            .ok_or_else(|| RemoteError::bad_request("unknown method"))?;
        let args = bind(method, payload, actor.dto_registry())?;
        let result = actor
            .call(method_name, args)
            .map_err(|fault| RemoteError::actor_error(fault.to_string()))?;
        serialize(&method.result_tag, result, actor.dto_registry())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpc_core::error::ErrorKind;
    use serde_json::json;

    #[tokio::test]
    async fn unknown_actor_is_an_actor_error() {
        let dispatcher = Dispatcher::new(Arc::new(Registry::new(None)), false);
        let envelope = dispatcher.dispatch("greeter", "add_two_ints", &Payload::default()).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error_type, Some(ErrorKind::ActorError));
    }

    #[tokio::test]
    async fn system_actor_is_hidden_when_registration_is_disabled() {
        let dispatcher = Dispatcher::new(Arc::new(Registry::new(None)), false);
        let mut payload = Payload::default();
        payload.args.push(json!("greeter"));
        payload.args.push(json!("/tmp/whatever.so"));
        let envelope = dispatcher.dispatch("system", "register_actor", &payload).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error_type, Some(ErrorKind::ActorError));
    }

    #[tokio::test]
    async fn core_list_actors_round_trips_through_the_dispatcher() {
        let dispatcher = Dispatcher::new(Arc::new(Registry::new(None)), false);
        let envelope = dispatcher.dispatch("core", "list_actors", &Payload::default()).await;
        assert!(envelope.success);
        assert_eq!(envelope.result, json!(["core"]));
    }
}
