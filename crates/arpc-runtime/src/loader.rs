use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arpc_plugin::Actor;
use libloading::{Library, Symbol};
use tracing::instrument;

/// The `extern "C"` constructor symbol every actor plugin exports via
/// [`arpc_plugin::export_actor!`].
const ENTRYPOINT_SYMBOL: &[u8] = b"arpc_actor_create";

// A trait-object pointer has no C layout; this crosses the ABI boundary
// soundly only because loader and plugin share the same `arpc-plugin`
// vtable layout, which requires the same compiler version on both sides.
#[allow(improper_ctypes_definitions)]
type PluginCreate = unsafe extern "C" fn() -> *mut dyn Actor;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load actor module `{path}`: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("actor module `{path}` is missing the `arpc_actor_create` entrypoint: {source}")]
    MissingEntrypoint {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
}

/// A process-wide table of loaded actor modules, keyed by canonical path.
///
/// Re-loading the same path is idempotent: the dynamic library is opened at
/// most once per process lifetime. Each call to [`ModuleTable::instantiate`]
/// still invokes the module's constructor, so a module can back more than
/// one actor instance if its constructor is parameterized, but the
/// underlying `Library` (and thus its module id) is shared.
#[derive(Default)]
pub struct ModuleTable {
    libraries: Mutex<HashMap<PathBuf, Arc<Library>>>,
}

impl ModuleTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A stable identifier for the module backing `path`, shared by every
    /// actor instantiated from it. Derived from the canonicalized path so
    /// two actors loaded from the same file report the same module id.
    pub fn module_id(path: &Path) -> std::io::Result<String> {
        let canonical = path.canonicalize()?;
        Ok(canonical.to_string_lossy().into_owned())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn load(&self, path: &Path) -> Result<Arc<Library>, LoadError> {
        let canonical = path.to_path_buf();
        if let Some(lib) = self.libraries.lock().expect("module table lock").get(&canonical) {
            tracing::debug!("module already loaded, reusing handle");
            return Ok(Arc::clone(lib));
        }
        // SAFETY: actor plugins are trusted build artifacts for this
        // process; `libloading` cannot itself guarantee the library does
        // not run arbitrary code on load, which is true of dynamic loading
        // in any language.
        let library = unsafe { Library::new(path) }
            .map_err(|source| LoadError::Library { path: canonical.clone(), source })?;
        let library = Arc::new(library);
        self.libraries
            .lock()
            .expect("module table lock")
            .insert(canonical, Arc::clone(&library));
        Ok(library)
    }

    /// Loads `path` (if not already loaded) and instantiates a fresh actor
    /// from it by calling its `arpc_actor_create` entrypoint.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn instantiate(&self, path: &Path) -> Result<Box<dyn Actor>, LoadError> {
        let library = self.load(path)?;
        // SAFETY: the symbol is looked up by the ABI name every actor
        // plugin built against `arpc-plugin::export_actor!` exports, and
        // its signature matches `PluginCreate` exactly.
        let actor = unsafe {
            let constructor: Symbol<PluginCreate> = library
                .get(ENTRYPOINT_SYMBOL)
                .map_err(|source| LoadError::MissingEntrypoint { path: path.to_path_buf(), source })?;
            Box::from_raw(constructor())
        };
        Ok(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_nonexistent_path() {
        let table = ModuleTable::new();
        let err = table.instantiate(Path::new("/no/such/actor.so"));
        assert!(matches!(err, Err(LoadError::Library { .. })));
    }
}
