// Smile Bot Relay — Configuration
//
// One serde struct with defaults, loaded from a TOML file when present and
// overridable by environment variables. The storage backend follows the
// original deployment switch: a remote object-store URL in the environment
// flips uploads from local disk to the remote provider.

use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file (default `relay.toml`).
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to bind — "127.0.0.1" (local only) or "0.0.0.0" (LAN).
    pub bind_address: String,
    pub port: u16,
    /// Title shown on the chat page.
    pub page_title: String,
    /// Bound on every upstream fetcher call, in seconds.
    pub fetch_timeout_secs: u64,
    /// Directory for locally stored uploads. Created at startup; creation
    /// failure is fatal.
    pub upload_dir: PathBuf,
    /// Base URL of a remote object store. When set, uploads go there
    /// instead of local disk.
    pub remote_storage_url: Option<String>,
    /// Base URL of a local text-generation endpoint (Ollama-style
    /// `/api/generate`). Enables the Assistant sector.
    pub generator_url: Option<String>,
    /// Model name passed to the text-generation endpoint.
    pub generator_model: String,
    /// Path to TLS certificate PEM file (enables HTTPS/WSS when set with
    /// tls_key_path).
    pub tls_cert_path: Option<String>,
    /// Path to TLS private key PEM file.
    pub tls_key_path: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            bind_address: "127.0.0.1".into(),
            port: 3000,
            page_title: "Smile Bot".into(),
            fetch_timeout_secs: 30,
            upload_dir: PathBuf::from("uploads"),
            remote_storage_url: None,
            generator_url: None,
            generator_model: "gpt2".into(),
            tls_cert_path: None,
            tls_key_path: None,
        }
    }
}

impl RelayConfig {
    /// Load config: TOML file if it exists, defaults otherwise, then
    /// environment overrides on top.
    pub fn load() -> RelayResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "relay.toml".into());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> RelayResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| RelayError::Config(format!("Parse {}: {}", path.display(), e)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => log::warn!("[config] Ignoring non-numeric PORT={}", port),
            }
        }
        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("REMOTE_STORAGE_URL") {
            if !url.is_empty() {
                self.remote_storage_url = Some(url);
            }
        }
        if let Ok(url) = std::env::var("GENERATOR_URL") {
            if !url.is_empty() {
                self.generator_url = Some(url);
            }
        }
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}
