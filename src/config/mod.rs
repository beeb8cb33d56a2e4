//! Server configuration management for `mediasrv.toml`.
//!
//! # Sections
//!
//! | Section       | Purpose                                          |
//! |---------------|--------------------------------------------------|
//! | `[serve]`     | Roots, port and developer mode                   |
//! | `[addons]`    | Addon folder and per-addon web export patterns   |
//! | `[backend]`   | Standalone backend data (i18n bundle)            |
//!
//! Precedence, lowest first: defaults, config file, `MEDIASRV_PORT`, CLI flags.
//! Relative paths in the file are taken relative to the file's directory.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{AddonsConfig, BackendConfig, ServeConfig};

use crate::log;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable that overrides `serve.port`.
pub const PORT_ENV: &str = "MEDIASRV_PORT";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing mediasrv.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Media server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Addon settings
    #[serde(default)]
    pub addons: AddonsConfig,

    /// Standalone backend settings
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Config {
    /// Load `path` if it exists, otherwise start from defaults rooted at the
    /// current directory. Applies the environment port override and makes all
    /// paths absolute.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let mut config = Self::from_path(path)?;
            config.root = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            config
        } else {
            Self::default()
        };

        if config.root.as_os_str().is_empty() {
            config.root = std::env::current_dir()
                .map_err(|err| ConfigError::Io(PathBuf::from("."), err))?;
        }

        config.apply_port_override(std::env::var(PORT_ENV).ok().as_deref())?;
        config.finalize();
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let (config, _) = Self::parse_with_ignored(content)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Apply a port override read from the environment.
    ///
    /// Unset, empty and `0` all mean "let the OS choose" unless the file set
    /// a port, in which case only a non-empty value replaces it.
    pub fn apply_port_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        self.serve.port = value.parse().map_err(|_| {
            ConfigError::Validation(format!("{PORT_ENV} must be a port number, got `{value}`"))
        })?;
        Ok(())
    }

    /// Join `path` onto the config root unless it is already absolute.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            normalize(&self.root.join(path))
        }
    }

    /// Make every configured path absolute.
    fn finalize(&mut self) {
        self.serve.web_root = self.root_join(&self.serve.web_root);
        self.serve.data_dir = self.root_join(&self.serve.data_dir);
        self.serve.export_dir = self.serve.export_dir.as_ref().map(|p| self.root_join(p));
        self.addons.folder = self.root_join(&self.addons.folder);
        self.backend.i18n = self.backend.i18n.as_ref().map(|p| self.root_join(p));
    }
}

/// Drop `.` components so `root/./web` and `root/web` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

#[cfg(test)]
pub fn test_parse_config(extra: &str) -> Config {
    let (parsed, ignored) = Config::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_are_collected() {
        let (_, ignored) =
            Config::parse_with_ignored("[serve]\nport = 1\nbogus = true\n[extra]\nx = 1").unwrap();
        assert_eq!(ignored, vec!["serve.bogus".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_str("[serve\nport = "),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_port_override() {
        let mut config = test_parse_config("[serve]\nport = 3000");

        config.apply_port_override(None).unwrap();
        assert_eq!(config.serve.port, 3000);

        config.apply_port_override(Some("")).unwrap();
        assert_eq!(config.serve.port, 3000);

        config.apply_port_override(Some("40000")).unwrap();
        assert_eq!(config.serve.port, 40000);

        config.apply_port_override(Some("0")).unwrap();
        assert_eq!(config.serve.port, 0);
    }

    #[test]
    fn test_port_override_rejects_garbage() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_port_override(Some("http")),
            Err(ConfigError::Validation(_))
        ));
        assert!(config.apply_port_override(Some("70000")).is_err());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mediasrv.toml");
        fs::write(
            &path,
            "[serve]\nweb_root = \"media\"\nexport_dir = \"/abs/web\"\n[backend]\ni18n = \"./i18n.bin\"",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.serve.web_root, dir.path().join("media"));
        assert_eq!(config.serve.data_dir, dir.path());
        assert_eq!(config.serve.export_dir, Some(PathBuf::from("/abs/web")));
        assert_eq!(config.addons.folder, dir.path().join("addons21"));
        assert_eq!(config.backend.i18n, Some(dir.path().join("i18n.bin")));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.serve.web_root.is_absolute());
        assert!(config.serve.export_dir.is_none());
    }

    #[test]
    fn test_load_unreadable_file() {
        let dir = TempDir::new().unwrap();
        // A directory exists but can't be read as a file
        let path = dir.path().join("mediasrv.toml");
        fs::create_dir(&path).unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Io(..))));
    }
}
