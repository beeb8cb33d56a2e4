//! Interfaces to the embedding application.
//!
//! The server never owns addon metadata or collection data. It reaches them
//! through the traits below, queried on every request.

mod addons;
mod backend;
mod export;

pub use addons::SharedAddons;
pub use backend::BundleBackend;
pub use export::locate_export_folder;

use crate::error::BackendError;
use std::path::PathBuf;
use std::sync::Arc;

/// Addon manager view used for `/_addons/` redirects.
pub trait AddonRegistry: Send + Sync {
    /// Regex an addon registered for files it allows to be served, if any.
    fn web_exports(&self, addon: &str) -> Option<String>;

    /// Directory that holds one subdirectory per addon.
    fn addons_folder(&self) -> PathBuf;
}

/// Collection backend reached by the POST commands.
pub trait Backend: Send + Sync {
    /// Serialized graph/statistics data for `search` over the last `days`.
    fn graphs(&self, search: &str, days: u32) -> Result<Vec<u8>, BackendError>;

    /// Serialized translation bundle for the web components.
    fn i18n_resources(&self) -> Vec<u8>;
}

/// Handle to the embedding application, shared by all request threads.
#[derive(Clone)]
pub struct HostContext {
    addons: Option<Arc<dyn AddonRegistry>>,
    backend: Arc<dyn Backend>,
}

impl HostContext {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            addons: None,
            backend,
        }
    }

    /// Attach the addon manager. Until this is called `/_addons/` requests
    /// are served from the web root unchanged.
    pub fn with_addons(mut self, addons: Arc<dyn AddonRegistry>) -> Self {
        self.addons = Some(addons);
        self
    }

    pub fn addons(&self) -> Option<&dyn AddonRegistry> {
        self.addons.as_deref()
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}
