//! `[addons]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [addons]
//! folder = "addons21"
//!
//! [addons.web_exports]
//! 1234567 = "web/.*\\.(js|css|png)"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Addon folder and the web export pattern each addon registers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonsConfig {
    /// Directory holding one subdirectory per addon.
    pub folder: PathBuf,

    /// Addon id → regex of sub-paths it allows to be served.
    pub web_exports: BTreeMap<String, String>,
}

impl Default for AddonsConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("addons21"),
            web_exports: BTreeMap::new(),
        }
    }
}
