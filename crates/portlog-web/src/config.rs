use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:5173"];

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Where uploads are staged while a request is processed
    pub upload_dir: PathBuf,
    /// Per-request combined output dumps; disabled when unset
    pub dump_dir: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
    /// Pipeline configuration file (JSON)
    pub pipeline_config: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

fn default_upload_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from("uploaded_files"),
        |d| d.join("portlog").join("uploads"),
    )
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            upload_dir: default_upload_dir(),
            dump_dir: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| (*o).to_string()).collect(),
            pipeline_config: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(port) = lookup("PORTLOG_PORT") {
            match port.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid PORTLOG_PORT"),
            }
        }

        if let Some(dir) = lookup("PORTLOG_UPLOAD_DIR").filter(|d| !d.trim().is_empty()) {
            config.upload_dir = PathBuf::from(dir);
        }

        config.dump_dir = lookup("PORTLOG_DUMP_DIR")
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        if let Some(origins) = lookup("PORTLOG_ALLOWED_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        config.pipeline_config = lookup("PORTLOG_CONFIG")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(mb) = lookup("PORTLOG_MAX_UPLOAD_MB") {
            match mb
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|mb| *mb > 0)
                .and_then(|mb| mb.checked_mul(1024 * 1024))
            {
                Some(bytes) => config.max_upload_bytes = bytes,
                None => tracing::warn!(value = %mb, "Ignoring invalid PORTLOG_MAX_UPLOAD_MB"),
            }
        }

        config
    }
}
