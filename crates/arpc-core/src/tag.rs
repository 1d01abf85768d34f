use serde::{Deserialize, Serialize};

/// Domain of a parameter's or a result's declared type.
///
/// A tag is either one of the built-in scalars or the name of a DTO type
/// reachable from the actor's module. `Dto` carries that name rather than
/// being a closed set, since DTO types are user-defined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum TypeTag {
    Int,
    Str,
    Float,
    Bool,
    List,
    Dict,
    Tuple,
    Bytes,
    /// No result (only valid as a `result_type_tag`).
    Null,
    /// A user-defined DTO type, named by its registered type name.
    Dto(String),
}

impl TypeTag {
    /// The tag's name as it appears in binder/serializer error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Str => "str",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::List => "list",
            TypeTag::Dict => "dict",
            TypeTag::Tuple => "tuple",
            TypeTag::Bytes => "bytes",
            TypeTag::Null => "null",
            TypeTag::Dto(name) => name,
        }
    }

    /// True if this tag names a user-defined DTO type rather than a
    /// built-in scalar.
    #[must_use]
    pub fn is_dto(&self) -> bool {
        matches!(self, TypeTag::Dto(_))
    }

    /// Checks whether `value`'s JSON shape matches this scalar tag. DTO tags
    /// are not checked here: DTO reconstruction is attempted separately by
    /// the binder via `from_mapping`.
    #[must_use]
    pub fn matches_scalar(&self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match self {
            TypeTag::Int => value.is_i64() || value.is_u64(),
            TypeTag::Float => value.is_f64() || value.is_i64() || value.is_u64(),
            TypeTag::Str | TypeTag::Bytes => value.is_string(),
            TypeTag::Bool => value.is_boolean(),
            TypeTag::List | TypeTag::Tuple => value.is_array(),
            TypeTag::Dict => value.is_object(),
            TypeTag::Null => value.is_null(),
            TypeTag::Dto(_) => matches!(value, Value::Object(_)),
        }
    }

    /// Best-effort name of the observed JSON shape, for type-mismatch
    /// messages (`"parameter (x) supposed to be of type (int), but found
    /// (str)"`).
    #[must_use]
    pub fn observed_name(value: &serde_json::Value) -> &'static str {
        match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "bool",
            serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "int",
            serde_json::Value::Number(_) => "float",
            serde_json::Value::String(_) => "str",
            serde_json::Value::Array(_) => "list",
            serde_json::Value::Object(_) => "dict",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_matching() {
        assert!(TypeTag::Int.matches_scalar(&json!(3)));
        assert!(!TypeTag::Int.matches_scalar(&json!("a")));
        assert!(TypeTag::Dict.matches_scalar(&json!({"attr": 1})));
    }

    #[test]
    fn observed_names() {
        assert_eq!(TypeTag::observed_name(&json!("a")), "str");
        assert_eq!(TypeTag::observed_name(&json!(1)), "int");
        assert_eq!(TypeTag::observed_name(&json!(1.5)), "float");
    }
}
