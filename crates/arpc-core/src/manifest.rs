use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The persisted `name -> path` actor manifest (§6 "Configuration
/// persistence"). Format is implementation-defined, not part of the wire
/// contract: a TOML file with a single `[actors]` table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorManifest {
    #[serde(default)]
    pub actors: BTreeMap<String, String>,
}

impl ActorManifest {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
