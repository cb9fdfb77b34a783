//! Well-known paths inside a workspace directory.

use std::path::{Path, PathBuf};

/// Directory created by `mf init` at the workspace root.
pub const MAPFORM_DIR: &str = ".mapform";

#[must_use]
pub fn mapform_dir(root: &Path) -> PathBuf {
    root.join(MAPFORM_DIR)
}

#[must_use]
pub fn store_path(root: &Path) -> PathBuf {
    mapform_dir(root).join("store.sqlite3")
}

#[must_use]
pub fn config_path(root: &Path) -> PathBuf {
    mapform_dir(root).join("config.toml")
}

#[must_use]
pub fn session_lock_path(root: &Path) -> PathBuf {
    mapform_dir(root).join("session.lock")
}

/// True when `mf init` has run in `root`.
#[must_use]
pub fn is_initialized(root: &Path) -> bool {
    store_path(root).exists()
}
