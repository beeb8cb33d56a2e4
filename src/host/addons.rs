//! In-memory addon registry.

use super::AddonRegistry;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

/// Addon registry whose web export patterns can change while serving.
///
/// Addons register patterns when they are enabled and drop them when they are
/// disabled, so lookups always read the current table.
#[derive(Debug)]
pub struct SharedAddons {
    folder: PathBuf,
    exports: RwLock<FxHashMap<String, String>>,
}

impl SharedAddons {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            exports: RwLock::new(FxHashMap::default()),
        }
    }

    /// Seed the table, e.g. from the `[addons.web_exports]` config section.
    pub fn with_exports<I, K, V>(self, exports: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        {
            let mut table = self.exports.write();
            for (addon, pattern) in exports {
                table.insert(addon.into(), pattern.into());
            }
        }
        self
    }

    /// Allow `addon` to serve files whose path matches `pattern`.
    pub fn set_web_exports(&self, addon: impl Into<String>, pattern: impl Into<String>) {
        self.exports.write().insert(addon.into(), pattern.into());
    }

    /// Stop serving files for `addon`.
    pub fn remove_web_exports(&self, addon: &str) -> Option<String> {
        self.exports.write().remove(addon)
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

impl AddonRegistry for SharedAddons {
    fn web_exports(&self, addon: &str) -> Option<String> {
        self.exports.read().get(addon).cloned()
    }

    fn addons_folder(&self) -> PathBuf {
        self.folder.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_reflects_updates() {
        let addons = SharedAddons::new("/addons");
        assert_eq!(addons.web_exports("1234"), None);

        addons.set_web_exports("1234", r"web/.*\.js");
        assert_eq!(addons.web_exports("1234").as_deref(), Some(r"web/.*\.js"));

        addons.set_web_exports("1234", r"web/.*");
        assert_eq!(addons.web_exports("1234").as_deref(), Some("web/.*"));

        assert_eq!(addons.remove_web_exports("1234").as_deref(), Some("web/.*"));
        assert_eq!(addons.web_exports("1234"), None);
    }

    #[test]
    fn test_seeded_exports() {
        let addons = SharedAddons::new("/addons").with_exports([("a", "x"), ("b", "y")]);
        assert_eq!(addons.web_exports("a").as_deref(), Some("x"));
        assert_eq!(addons.web_exports("b").as_deref(), Some("y"));
        assert_eq!(addons.addons_folder(), PathBuf::from("/addons"));
        assert_eq!(addons.folder(), Path::new("/addons"));
    }
}
