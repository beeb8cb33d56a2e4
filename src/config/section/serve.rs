//! `[serve]` section configuration.
//!
//! Contains media server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! web_root = "collection.media"   # Directory plain GET requests are served from
//! data_dir = "."                  # Searched for the bundled `web` folder
//! export_dir = "data/web"         # Explicit export folder (skips the search)
//! port = 0                        # 0 = let the OS choose; MEDIASRV_PORT overrides
//! dev_mode = false                # Print request lines and transfer errors
//! ```
//!
//! The server only ever binds `127.0.0.1`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Media server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Directory served for requests outside the virtual trees.
    pub web_root: PathBuf,

    /// Directory searched for the `web` export folder.
    pub data_dir: PathBuf,

    /// Export folder to use instead of searching `data_dir`.
    pub export_dir: Option<PathBuf>,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,

    /// Developer diagnostics.
    pub dev_mode: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from("."),
            data_dir: PathBuf::from("."),
            export_dir: None,
            port: 0,
            dev_mode: false,
        }
    }
}
