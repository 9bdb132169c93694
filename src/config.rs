use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::errors::ConfigError;
use crate::services::broadcast_service::DEFAULT_SUBSCRIBER_BUFFER;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FRIENDSGIVING_CONFIG";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    /// Path to the menu JSON file. Created with the seed menu if missing.
    pub menu_path: String,

    /// Directory served for every path the API does not handle.
    #[serde(default)]
    pub static_dir: Option<String>,

    pub server_version: String,

    /// Pending snapshots each stream client may queue before further
    /// snapshots are dropped for it.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str::<AppConfig>(&file).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Where to look for `config.json`, in order: `$FRIENDSGIVING_CONFIG`,
    /// next to the executable, then one directory above it.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(explicit) = env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }

        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join(CONFIG_FILE));
            paths.push(exe_dir.join("..").join(CONFIG_FILE));
        }

        paths
    }

    /// First existing candidate path, if any.
    pub fn locate() -> Option<PathBuf> {
        Self::candidate_paths().into_iter().find(|p| p.exists())
    }
}
