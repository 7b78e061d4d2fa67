//! Where the configuration file lives.

use std::path::PathBuf;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "MANDELTILE_CONFIG";

/// Directory containing the running executable. Falls back to current directory if unavailable.
pub fn exe_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Configuration file path: `$MANDELTILE_CONFIG`, else `config.json` in the
/// OS config directory, else next to the executable.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    directories::ProjectDirs::from("", "", "MandelTile")
        .map(|dirs| dirs.config_dir().join("config.json"))
        .unwrap_or_else(|| exe_directory().join("config.json"))
}
