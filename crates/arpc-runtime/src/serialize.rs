use arpc_core::error::RemoteError;
use arpc_core::tag::TypeTag;
use arpc_plugin::DtoRegistry;
use serde_json::Value;

/// Serializes a method's actual return value against its declared
/// `result_tag` (§4.4).
///
/// * A declared `null` result always serializes as JSON `null`, regardless
///   of what the method actually returned (a warning is logged if it
///   returned something else).
/// * A value already matching the declared scalar tag passes through.
/// * A declared DTO result is round-tripped (and thus validated) through
///   `registry`.
/// * A declared DTO result that is instead a matching scalar passes
///   through tolerantly, with a warning.
/// * Anything else is a return-type violation: `ACTOR_ERROR`, `result`
///   becomes `null`.
pub fn serialize(result_tag: &TypeTag, value: Value, registry: &DtoRegistry) -> Result<Value, RemoteError> {
    if matches!(result_tag, TypeTag::Null) {
        if !value.is_null() {
            tracing::warn!(?value, "method declared no result but returned a value");
        }
        return Ok(Value::Null);
    }

    if let TypeTag::Dto(type_name) = result_tag {
        if let Value::Object(mapping) = &value {
            return registry
                .normalize(type_name, mapping)
                .map(Value::Object)
                .map_err(|e| {
                    tracing::warn!(error = %e, type_name, "returned mapping is not a valid DTO instance");
                    RemoteError::actor_error(format!(
                        "return-type violation: expected ({type_name}), got an invalid mapping: {e}"
                    ))
                });
        }
        if is_any_scalar(&value) {
            tracing::warn!(
                type_name,
                "method declared a DTO result but returned a bare scalar; passing through"
            );
            return Ok(value);
        }
        return Err(RemoteError::actor_error(format!(
            "return-type violation: expected ({type_name}), got ({})",
            TypeTag::observed_name(&value)
        )));
    }

    if result_tag.matches_scalar(&value) {
        return Ok(value);
    }

    Err(RemoteError::actor_error(format!(
        "return-type violation: expected ({}), got ({})",
        result_tag.name(),
        TypeTag::observed_name(&value)
    )))
}

fn is_any_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_result_always_serializes_to_null() {
        let out = serialize(&TypeTag::Null, json!(42), &DtoRegistry::new()).expect("ok");
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn scalar_passes_through() {
        let out = serialize(&TypeTag::Int, json!(3), &DtoRegistry::new()).expect("ok");
        assert_eq!(out, json!(3));
    }

    #[test]
    fn scalar_type_mismatch_is_an_actor_error() {
        let err = serialize(&TypeTag::Int, json!("nope"), &DtoRegistry::new()).expect_err("mismatch");
        assert!(err.message.contains("return-type violation"));
    }

    #[test]
    fn dto_tolerant_path_accepts_a_matching_scalar() {
        let out = serialize(
            &TypeTag::Dto("Item".into()),
            json!(7),
            &DtoRegistry::new(),
        )
        .expect("tolerant pass-through");
        assert_eq!(out, json!(7));
    }
}
