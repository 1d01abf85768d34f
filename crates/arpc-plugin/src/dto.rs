use std::collections::HashMap;

use serde_json::{Map, Value};

/// A user-defined type reachable from an actor's module that can cross the
/// wire as a JSON mapping. The only way structured values cross the wire
/// (§3 "DTO type").
pub trait Dto: Sized {
    /// The name clients and the wire use to refer to this type; must match
    /// the `TypeTag::Dto` name declared on the relevant
    /// [`crate::MethodDescriptor`] parameters/results.
    fn type_name() -> &'static str;

    fn to_mapping(&self) -> Map<String, Value>;

    fn from_mapping(mapping: &Map<String, Value>) -> Result<Self, String>;
}

type Normalizer = Box<dyn Fn(&Map<String, Value>) -> Result<Map<String, Value>, String> + Send + Sync>;

/// A narrow capability registry an actor builds once from its `Dto` impls.
///
/// The binder and serializer are generic over JSON values and never see a
/// native Rust DTO type; they ask this registry to round-trip a mapping
/// through a named type's `from_mapping`/`to_mapping`, which both validates
/// the mapping's shape and canonicalizes it (e.g. filling defaults).
#[derive(Default)]
pub struct DtoRegistry {
    entries: HashMap<&'static str, Normalizer>,
}

impl DtoRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` so `normalize(T::type_name(), ...)` round-trips
    /// through `T::from_mapping`/`T::to_mapping`.
    #[must_use]
    pub fn register<T: Dto>(mut self) -> Self {
        self.entries.insert(
            T::type_name(),
            Box::new(|mapping| T::from_mapping(mapping).map(|value| value.to_mapping())),
        );
        self
    }

    /// Round-trips `mapping` through the named DTO type, returning the
    /// canonical mapping on success, or an error naming the unknown type or
    /// the `from_mapping` failure.
    pub fn normalize(
        &self,
        type_name: &str,
        mapping: &Map<String, Value>,
    ) -> Result<Map<String, Value>, String> {
        let normalize = self
            .entries
            .get(type_name)
            .ok_or_else(|| format!("unknown DTO type `{type_name}`"))?;
        normalize(mapping)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }
}
