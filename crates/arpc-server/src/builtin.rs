//! The two built-in system actors (§4.6): `core` (introspection, always
//! mounted) and `system` (runtime registration, mounted only when the
//! server is configured to accept it). Neither is a loaded plugin; both
//! are dispatched directly against the [`Registry`].

use std::collections::BTreeMap;

use arpc_core::envelope::Payload;
use arpc_core::error::RemoteError;
use arpc_core::method::{ActorInfo, MethodInfo, Param};
use arpc_core::tag::TypeTag;
use serde_json::{json, Value};

use crate::registry::Registry;

fn method(doc: &str, params: &[(&str, TypeTag)], result_tag: TypeTag) -> MethodInfo {
    MethodInfo {
        doc: doc.to_string(),
        params: params
            .iter()
            .map(|(name, tag)| Param {
                name: (*name).to_string(),
                tag: tag.clone(),
            })
            .collect(),
        result_tag,
    }
}

/// The synthetic [`ActorInfo`] for a built-in actor: neither is backed by a
/// loaded module, so `module_path`/`module_id` name the built-in itself
/// rather than a `.so` path.
fn builtin_info(name: &str, allow_register: bool) -> Option<ActorInfo> {
    let methods: BTreeMap<String, MethodInfo> = match name {
        arpc_core::CORE_ACTOR => [
            ("list_actors".to_string(), method("Lists every currently loaded actor.", &[], TypeTag::List)),
            (
                "info".to_string(),
                method("Describes a loaded actor's method table.", &[("name", TypeTag::Str)], TypeTag::Dict),
            ),
        ]
        .into_iter()
        .collect(),
        arpc_core::SYSTEM_ACTOR if allow_register => [
            (
                "register_actor".to_string(),
                method(
                    "Loads and mounts an actor module under `name`.",
                    &[("name", TypeTag::Str), ("path", TypeTag::Str)],
                    TypeTag::Bool,
                ),
            ),
            (
                "unregister_actor".to_string(),
                method("Unmounts a registered actor.", &[("name", TypeTag::Str)], TypeTag::Bool),
            ),
        ]
        .into_iter()
        .collect(),
        _ => return None,
    };
    Some(ActorInfo {
        name: name.to_string(),
        module_path: format!("<builtin:{name}>"),
        module_id: format!("<builtin:{name}>"),
        methods,
    })
}

fn string_arg(payload: &Payload, index: usize, name: &str) -> Result<String, RemoteError> {
    let value = payload
        .args
        .get(index)
        .cloned()
        .or_else(|| payload.kwargs.get(name).cloned())
        .ok_or_else(|| RemoteError::bad_request(format!("missing required argument `{name}`")))?;
    value.as_str().map(str::to_owned).ok_or_else(|| {
        RemoteError::bad_request(format!(
            "parameter ({name}) supposed to be of type (str), but found ({})",
            TypeTag::observed_name(&value)
        ))
    })
}

pub async fn call_core(registry: &Registry, method: &str, payload: &Payload, allow_register: bool) -> Result<Value, RemoteError> {
    match method {
        "list_actors" => {
            let mut names = registry.list_actors().await;
            names.push(arpc_core::CORE_ACTOR.to_string());
            if allow_register {
                names.push(arpc_core::SYSTEM_ACTOR.to_string());
            }
            names.sort();
            Ok(json!(names))
        }
        "info" => {
            let name = string_arg(payload, 0, "name")?;
            let info = match builtin_info(&name, allow_register) {
                Some(info) => info,
                None => registry
                    .info(&name)
                    .await
                    .ok_or_else(|| RemoteError::actor_error(format!("unknown actor `{name}`")))?,
            };
            serde_json::to_value(info).map_err(|e| RemoteError::internal(e.to_string()))
        }
        _ => Err(RemoteError::bad_request("unknown method")),
    }
}

pub async fn call_system(registry: &Registry, method: &str, payload: &Payload) -> Result<Value, RemoteError> {
    match method {
        "register_actor" => {
            let name = string_arg(payload, 0, "name")?;
            let path = string_arg(payload, 1, "path")?;
            registry
                .register(&name, &path)
                .await
                .map(|()| json!(true))
                .map_err(crate::registry::RegisterError::into_remote)
        }
        "unregister_actor" => {
            let name = string_arg(payload, 0, "name")?;
            Ok(json!(registry.unregister(&name).await))
        }
        _ => Err(RemoteError::bad_request("unknown method")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpc_core::envelope::Payload;

    #[tokio::test]
    async fn core_list_actors_contains_only_the_builtins_for_a_fresh_registry() {
        let registry = Registry::new(None);
        let result = call_core(&registry, "list_actors", &Payload::default(), false).await.expect("ok");
        assert_eq!(result, json!(["core"]));
    }

    #[tokio::test]
    async fn core_list_actors_includes_system_when_registration_is_allowed() {
        let registry = Registry::new(None);
        let result = call_core(&registry, "list_actors", &Payload::default(), true).await.expect("ok");
        assert_eq!(result, json!(["core", "system"]));
    }

    #[tokio::test]
    async fn core_info_describes_core_itself() {
        let registry = Registry::new(None);
        let mut payload = Payload::default();
        payload.args.push(json!("core"));
        let result = call_core(&registry, "info", &payload, false).await.expect("ok");
        let info: ActorInfo = serde_json::from_value(result).expect("valid ActorInfo");
        assert_eq!(info.name, "core");
        assert!(info.method("list_actors").is_some());
    }

    #[tokio::test]
    async fn core_info_hides_system_when_registration_is_disabled() {
        let registry = Registry::new(None);
        let mut payload = Payload::default();
        payload.args.push(json!("system"));
        let err = call_core(&registry, "info", &payload, false).await.expect_err("hidden");
        assert_eq!(err.kind, arpc_core::error::ErrorKind::ActorError);
    }

    #[tokio::test]
    async fn core_info_reports_actor_error_for_unknown_name() {
        let registry = Registry::new(None);
        let mut payload = Payload::default();
        payload.args.push(json!("greeter"));
        let err = call_core(&registry, "info", &payload, false).await.expect_err("unknown");
        assert_eq!(err.kind, arpc_core::error::ErrorKind::ActorError);
    }

    #[tokio::test]
    async fn system_register_actor_rejects_reserved_names() {
        let registry = Registry::new(None);
        let mut payload = Payload::default();
        payload.args.push(json!("core"));
        payload.args.push(json!("/tmp/whatever.so"));
        let err = call_system(&registry, "register_actor", &payload)
            .await
            .expect_err("reserved");
        assert_eq!(err.kind, arpc_core::error::ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn system_unregister_actor_is_idempotent() {
        let registry = Registry::new(None);
        let mut payload = Payload::default();
        payload.args.push(json!("nobody"));
        let result = call_system(&registry, "unregister_actor", &payload).await.expect("ok");
        assert_eq!(result, json!(false));
    }
}
