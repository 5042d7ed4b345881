//! Default paths for focusd components
//!
//! Paths are user-writable by default:
//! - Socket: `$XDG_RUNTIME_DIR/focusd/focusd.sock` or `/tmp/focusd-$USER/focusd.sock`
//! - Data: `$XDG_DATA_HOME/focusd` or `~/.local/share/focusd`
//! - Config: `$XDG_CONFIG_HOME/focusd/config.toml` or `~/.config/focusd/config.toml`

use std::path::PathBuf;

/// Environment variable for overriding the socket path
pub const FOCUS_SOCKET_ENV: &str = "FOCUSD_SOCKET";

/// Environment variable for overriding the data directory
pub const FOCUS_DATA_DIR_ENV: &str = "FOCUSD_DATA_DIR";

/// Environment variable for overriding the config file
pub const FOCUS_CONFIG_ENV: &str = "FOCUSD_CONFIG";

const SOCKET_FILENAME: &str = "focusd.sock";
const CONFIG_FILENAME: &str = "config.toml";
const DATABASE_FILENAME: &str = "focusd.db";

/// Application subdirectory name
const APP_DIR: &str = "focusd";

/// Get the default socket path.
///
/// Order of precedence:
/// 1. `$FOCUSD_SOCKET` environment variable (if set)
/// 2. `$XDG_RUNTIME_DIR/focusd/focusd.sock` (if XDG_RUNTIME_DIR is set)
/// 3. `/tmp/focusd-$USER/focusd.sock` (fallback)
pub fn default_socket_path() -> PathBuf {
    if let Ok(path) = std::env::var(FOCUS_SOCKET_ENV) {
        return PathBuf::from(path);
    }

    socket_path_without_env()
}

/// Get the socket path without checking the FOCUSD_SOCKET env var.
/// Used for config defaults where the env var is checked separately.
pub fn socket_path_without_env() -> PathBuf {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(runtime_dir).join(APP_DIR).join(SOCKET_FILENAME);
    }

    let username = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/{}-{}", APP_DIR, username)).join(SOCKET_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$FOCUSD_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/focusd` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/focusd` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(FOCUS_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking the FOCUSD_DATA_DIR env var.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$FOCUSD_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/focusd/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/focusd/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(FOCUS_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Database file inside a data directory
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}
