use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tag::TypeTag;

/// A declared parameter: its name (for keyword binding and error messages)
/// and its declared [`TypeTag`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub tag: TypeTag,
}

/// Introspected descriptor for one actor method. The receiver is excluded
/// from `params`; nothing here is sent on the wire except via
/// [`ActorInfo`]'s `core.info` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub doc: String,
    pub params: Vec<Param>,
    pub result_tag: TypeTag,
}

impl MethodInfo {
    #[must_use]
    pub fn required_params(&self) -> usize {
        self.params.len()
    }
}

/// Immutable descriptor produced once per loaded actor. Read-only after
/// construction; rebuilding it requires reloading the actor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInfo {
    pub name: String,
    pub module_path: String,
    pub module_id: String,
    pub methods: BTreeMap<String, MethodInfo>,
}

impl ActorInfo {
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }
}
