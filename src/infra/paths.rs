// src/infra/paths.rs - Config and data path resolution
//
// All paths respect the LOCALCHAT_HOME environment variable for isolation.
// When LOCALCHAT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.localchat/ and data uses XDG_DATA_HOME/localchat.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the LOCALCHAT_HOME override, if set.
fn localchat_home() -> Option<PathBuf> {
    std::env::var_os("LOCALCHAT_HOME").map(PathBuf::from)
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $LOCALCHAT_HOME/ or ~/.localchat/
pub fn config_dir() -> PathBuf {
    if let Some(home) = localchat_home() {
        return home;
    }
    dirs_home().join(".localchat")
}

/// Data directory: $LOCALCHAT_HOME/data/ or ~/.local/share/localchat/
pub fn data_dir() -> PathBuf {
    if let Some(home) = localchat_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "localchat") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
