//! `[backend]` section configuration.
//!
//! Only used when the server runs standalone, without a host application.
//!
//! ```toml
//! [backend]
//! i18n = "i18n.bin"   # Served by POST /_anki/i18nResources
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Standalone backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Serialized translation bundle file.
    pub i18n: Option<PathBuf>,
}
