//! Request path to filesystem path resolution.
//!
//! Every GET goes through two steps:
//!
//! 1. [`translate_path`] maps the URL onto the web root, the way a plain
//!    static file server would.
//! 2. [`resolve`] applies the redirect rules for the two virtual trees:
//!
//! | Prefix                     | Served from                                  |
//! |----------------------------|----------------------------------------------|
//! | `<web_root>/_anki/…`       | the export root, unconditionally             |
//! | `<web_root>/_addons/id/…`  | `<addons_folder>/id/…` if the addon allows it |
//! | anything else              | unchanged                                    |
//!
//! Addon patterns are looked up and compiled on every call since addons can
//! be enabled or disabled while the server runs.


use crate::debug;
use crate::host::AddonRegistry;
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Virtual directory redirected to the export root.
pub const EXPORT_PREFIX: &str = "_anki";

/// Virtual directory redirected into addon folders.
pub const ADDONS_PREFIX: &str = "_addons";

/// The two fixed roots a request can be served from.
#[derive(Debug, Clone)]
pub struct ServeRoots {
    /// Directory plain requests are served from.
    pub web_root: PathBuf,
    /// Directory that shadows `/_anki/`.
    pub export_root: PathBuf,
}

impl ServeRoots {
    pub fn new(web_root: impl Into<PathBuf>, export_root: impl Into<PathBuf>) -> Self {
        Self {
            web_root: web_root.into(),
            export_root: export_root.into(),
        }
    }
}

/// Map a request URL onto `web_root`.
///
/// Query string and fragment are dropped, the path is percent-decoded and
/// normalized, and any segment that is not a plain file name (`..`, drive
/// prefixes, embedded separators) is discarded. A trailing `/` is kept so a
/// directory request still names a directory.
pub fn translate_path(url: &str, web_root: &Path) -> PathBuf {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let trailing_slash = path.trim_end().ends_with('/');
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut local = web_root.to_path_buf();
    for segment in segments {
        if is_plain_name(segment) {
            local.push(segment);
        }
    }
    if trailing_slash {
        local.push("");
    }
    local
}

/// Apply the `/_anki/` and `/_addons/` redirect rules to a translated path.
pub fn resolve(
    virtual_path: &Path,
    roots: &ServeRoots,
    addons: Option<&dyn AddonRegistry>,
) -> PathBuf {
    // Only `_anki/…` is redirected; a bare `_anki` names the web root entry
    if let Ok(rest) = virtual_path.strip_prefix(roots.web_root.join(EXPORT_PREFIX))
        && (!rest.as_os_str().is_empty() || has_trailing_separator(virtual_path))
    {
        return keep_trailing_separator(virtual_path, roots.export_root.join(rest));
    }

    if let Ok(rest) = virtual_path.strip_prefix(roots.web_root.join(ADDONS_PREFIX))
        && let Some(addons) = addons
        && let Some(target) = redirect_addon(rest, addons)
    {
        return keep_trailing_separator(virtual_path, target);
    }

    virtual_path.to_path_buf()
}

/// Redirect `<addon>/<sub_path>` if the addon exports a pattern matching it.
fn redirect_addon(rest: &Path, addons: &dyn AddonRegistry) -> Option<PathBuf> {
    let mut components = rest.components();
    let addon = match components.next()? {
        Component::Normal(name) => name.to_str()?,
        _ => return None,
    };
    let sub_path = components.as_path();
    if addon.is_empty() || sub_path.as_os_str().is_empty() {
        return None;
    }

    let pattern = addons.web_exports(addon)?;
    let matcher = match full_match(&pattern) {
        Ok(matcher) => matcher,
        Err(e) => {
            debug!("serve"; "addon {} has invalid web export pattern: {}", addon, e);
            return None;
        }
    };

    // Pattern authors write `/`; Windows paths arrive with `\`
    let native = sub_path.to_string_lossy();
    let portable = native.replace(MAIN_SEPARATOR, "/");
    if matcher.is_match(&native) || matcher.is_match(&portable) {
        Some(addons.addons_folder().join(addon).join(sub_path))
    } else {
        None
    }
}

/// Compile `pattern` so it must match the whole input.
fn full_match(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\A(?:{pattern})\z"))
}

fn is_plain_name(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == segment
    )
}

fn has_trailing_separator(path: &Path) -> bool {
    path.to_string_lossy()
        .chars()
        .last()
        .is_some_and(std::path::is_separator)
}

fn keep_trailing_separator(original: &Path, mut target: PathBuf) -> PathBuf {
    if has_trailing_separator(original) {
        target.push("");
    }
    target
}
