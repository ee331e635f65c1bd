//! Data directory resolution.

use std::path::PathBuf;

/// Resolve the directory holding the database and `config.toml`.
///
/// `ANONCHAT_DATA_DIR` wins when set; otherwise `~/.anonchat`, falling back
/// to `./.anonchat` when no home directory is available.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ANONCHAT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".anonchat");
    }

    PathBuf::from(".anonchat")
}
