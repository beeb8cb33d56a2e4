//! Locating the bundled `web` export folder.

use crate::error::ServerError;
use std::path::{Path, PathBuf};

/// Find the folder whose contents are served under `/_anki/`.
///
/// Source checkouts and most packaged builds keep it at `<data_dir>/web`.
/// macOS app bundles keep it under `Contents/Resources/web`, two levels above
/// the executable. Anywhere else a missing folder is a startup error.
pub fn locate_export_folder(data_dir: &Path) -> Result<PathBuf, ServerError> {
    let in_data = absolute(&data_dir.join("web"));
    if in_data.is_dir() {
        return Ok(in_data);
    }

    if cfg!(target_os = "macos")
        && let Some(bundled) = bundled_resources_web()
    {
        return Ok(bundled);
    }

    Err(ServerError::ExportFolderMissing(in_data))
}

fn bundled_resources_web() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    Some(dir.join("../../Resources/web"))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
