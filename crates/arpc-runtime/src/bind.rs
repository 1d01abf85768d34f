use arpc_core::envelope::Payload;
use arpc_core::error::RemoteError;
use arpc_core::method::MethodInfo;
use arpc_core::tag::TypeTag;
use arpc_plugin::DtoRegistry;
use serde_json::Value;

/// Binds a decoded `{args, kwargs}` [`Payload`] to `method.params` (§4.4).
///
/// Positional args fill parameters in declared order; kwargs fill by name.
/// Excess args, missing required params, and a kwarg duplicating an already
/// positionally-bound parameter are all `BAD_REQUEST`s. DTO-tagged
/// parameters are round-tripped through `registry` before the scalar check
/// runs, so a plugin's own `from_mapping` gets the first say on whether a
/// mapping is well-formed.
pub fn bind(
    method: &MethodInfo,
    payload: &Payload,
    registry: &DtoRegistry,
) -> Result<Vec<Value>, RemoteError> {
    if payload.args.len() > method.params.len() {
        return Err(RemoteError::bad_request(format!(
            "too many positional arguments: expected at most {}, got {}",
            method.params.len(),
            payload.args.len()
        )));
    }

    let mut bound: Vec<Option<Value>> = payload.args.iter().cloned().map(Some).collect();
    bound.resize(method.params.len(), None);

    for (key, value) in &payload.kwargs {
        let Some(index) = method.params.iter().position(|p| &p.name == key) else {
            return Err(RemoteError::bad_request(format!(
                "unexpected keyword argument `{key}`"
            )));
        };
        if bound[index].is_some() {
            return Err(RemoteError::bad_request(format!(
                "parameter `{key}` bound both positionally and by keyword"
            )));
        }
        bound[index] = Some(value.clone());
    }

    let mut result = Vec::with_capacity(method.params.len());
    for (param, slot) in method.params.iter().zip(bound) {
        let Some(value) = slot else {
            return Err(RemoteError::bad_request(format!(
                "missing required argument `{}`",
                param.name
            )));
        };
        result.push(coerce(&param.name, &param.tag, value, registry)?);
    }
    Ok(result)
}

fn coerce(
    param_name: &str,
    tag: &TypeTag,
    value: Value,
    registry: &DtoRegistry,
) -> Result<Value, RemoteError> {
    if let TypeTag::Dto(type_name) = tag {
        if let Value::Object(mapping) = &value {
            let normalized = registry.normalize(type_name, mapping).map_err(|e| {
                RemoteError::bad_request(format!(
                    "parameter ({param_name}) failed to reconstruct as ({type_name}): {e}"
                ))
            })?;
            return Ok(Value::Object(normalized));
        }
    }

    if tag.matches_scalar(&value) {
        return Ok(value);
    }

    Err(RemoteError::bad_request(format!(
        "parameter ({param_name}) supposed to be of type ({}), but found ({})",
        tag.name(),
        TypeTag::observed_name(&value)
    )))
}
