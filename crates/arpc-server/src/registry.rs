use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use arpc_core::manifest::ActorManifest;
use arpc_core::method::ActorInfo;
use arpc_core::{is_reserved_actor_name, is_valid_identifier};
use arpc_plugin::Actor;
use arpc_runtime::{introspect, LoadError, ModuleTable};
use tokio::sync::RwLock;
use tracing::instrument;

struct LoadedActor {
    info: ActorInfo,
    actor: Arc<dyn Actor>,
}

/// Failure modes for `system.register_actor` (§4.6), distinct from the
/// dispatcher's own `RemoteError` taxonomy so the caller can decide
/// `BAD_REQUEST` vs `ACTOR_ERROR` once, in [`RegisterError::into_remote`].
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("actor name `{0}` is reserved")]
    ReservedName(String),
    #[error("`{0}` is not a valid actor identifier")]
    InvalidIdentifier(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to determine module id: {0}")]
    Io(#[from] std::io::Error),
    #[error("actor module rejected: {0}")]
    Invalid(String),
}

impl RegisterError {
    #[must_use]
    pub fn into_remote(self) -> arpc_core::error::RemoteError {
        use arpc_core::error::RemoteError;
        match &self {
            RegisterError::ReservedName(_) | RegisterError::InvalidIdentifier(_) => {
                RemoteError::bad_request(self.to_string())
            }
            RegisterError::Load(_) | RegisterError::Io(_) | RegisterError::Invalid(_) => {
                RemoteError::actor_error(self.to_string())
            }
        }
    }
}

/// The shared, concurrently-readable table of loaded actors (§5 "Shared
/// resources"): `actors_loaded` (module + method table, ready to dispatch)
/// and `actors_registered` (the persisted `name -> path` subset), both
/// guarded by one `tokio::sync::RwLock` per the teacher's
/// `crates/host/src/wasmbus/mod.rs` registry pattern.
pub struct Registry {
    // Field order matters here: struct fields drop in declaration order, and
    // `loaded` holds `Arc<dyn Actor>` trait objects whose vtables live inside
    // the `.so` files `module_table` keeps mapped. `module_table` must stay
    // declared last so those actors are dropped before their library is.
    loaded: RwLock<HashMap<String, LoadedActor>>,
    registered: RwLock<BTreeMap<String, String>>,
    manifest_path: Option<PathBuf>,
    module_table: ModuleTable,
}

impl Registry {
    #[must_use]
    pub fn new(manifest_path: Option<PathBuf>) -> Self {
        Self {
            loaded: RwLock::new(HashMap::new()),
            registered: RwLock::new(BTreeMap::new()),
            manifest_path,
            module_table: ModuleTable::new(),
        }
    }

    /// Reloads every actor named in the persisted manifest, best-effort: a
    /// single actor failing to reload is logged and skipped rather than
    /// aborting startup.
    #[instrument(skip(self))]
    pub async fn load_manifest(&self) {
        let Some(path) = self.manifest_path.clone() else {
            return;
        };
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to read actor manifest");
                return;
            }
        };
        let manifest = match ActorManifest::from_toml(&text) {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "failed to parse actor manifest");
                return;
            }
        };
        for (name, module_path) in manifest.actors {
            if let Err(e) = self.register(&name, &module_path).await {
                tracing::warn!(actor = %name, error = %e, "failed to reload actor from manifest");
            }
        }
    }

    async fn persist_manifest(&self) {
        let Some(path) = &self.manifest_path else {
            return;
        };
        let manifest = ActorManifest {
            actors: self.registered.read().await.clone(),
        };
        match manifest.to_toml() {
            Ok(text) => {
                if let Err(e) = tokio::fs::write(path, text).await {
                    tracing::warn!(error = %e, path = %path.display(), "failed to persist actor manifest");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize actor manifest"),
        }
    }

    /// Current keys of `actors_loaded`, in a stable (sorted) order.
    pub async fn list_actors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaded.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn info(&self, name: &str) -> Option<ActorInfo> {
        self.loaded.read().await.get(name).map(|a| a.info.clone())
    }

    pub async fn get(&self, name: &str) -> Option<(ActorInfo, Arc<dyn Actor>)> {
        self.loaded
            .read()
            .await
            .get(name)
            .map(|a| (a.info.clone(), Arc::clone(&a.actor)))
    }

    /// Validates, loads, instantiates, and introspects `path`, then
    /// atomically inserts the resulting actor into `actors_loaded` and
    /// `actors_registered` (§4.6). A module that fails introspection stays
    /// in the module table (loading is idempotent) but no actor entry is
    /// created.
    #[instrument(skip(self), fields(actor = name, path))]
    pub async fn register(&self, name: &str, path: &str) -> Result<(), RegisterError> {
        if is_reserved_actor_name(name) {
            return Err(RegisterError::ReservedName(name.to_string()));
        }
        if !is_valid_identifier(name) {
            return Err(RegisterError::InvalidIdentifier(name.to_string()));
        }
        let path_buf = PathBuf::from(path);
        let boxed = self.module_table.instantiate(&path_buf)?;
        let module_id = ModuleTable::module_id(&path_buf)?;
        let info = introspect(name, path, &module_id, boxed.as_ref())
            .map_err(|report| RegisterError::Invalid(report.message()))?;
        let actor: Arc<dyn Actor> = Arc::from(boxed);
        self.loaded
            .write()
            .await
            .insert(name.to_string(), LoadedActor { info, actor });
        self.registered
            .write()
            .await
            .insert(name.to_string(), path.to_string());
        self.persist_manifest().await;
        Ok(())
    }

    /// Removes `name` from both maps. Idempotent: calling this for an
    /// unknown name is not an error, it just returns `false`.
    #[instrument(skip(self), fields(actor = name))]
    pub async fn unregister(&self, name: &str) -> bool {
        let removed_loaded = self.loaded.write().await.remove(name).is_some();
        let removed_registered = self.registered.write().await.remove(name).is_some();
        let removed = removed_loaded || removed_registered;
        if removed {
            self.persist_manifest().await;
        }
        removed
    }
}
