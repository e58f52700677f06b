use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyshare_registry::{
    RegistryConfig, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_TTL_SECS,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Multipart framing allowance on top of `max_payload_bytes`, so that a
/// payload exactly at the limit is not cut off by the body limit.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Server configuration, loadable from TOML. Missing keys take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Prefix every route is mounted under.
    pub base_path: String,
    /// Directory holding uploaded payloads. It must belong to anyShare
    /// alone: at startup any file in it whose name is a valid share id
    /// (only `[a-z0-9]`, e.g. `notes`) and that no record references is
    /// deleted as an orphan payload.
    pub storage_root: PathBuf,
    pub snapshot_path: PathBuf,
    pub max_payload_bytes: u64,
    pub default_ttl_secs: i64,
    /// Seconds between periodic sweeps; `0` leaves sweeping to creates and
    /// reads.
    pub sweep_interval_secs: u64,
    /// Treat a malformed `ttl` parameter as ttl 0 (immediately expired)
    /// instead of rejecting the request.
    pub legacy_invalid_ttl: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8082)),
            base_path: "/anyShare".into(),
            storage_root: PathBuf::from("tmp"),
            snapshot_path: PathBuf::from("tmp_file_map.json"),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            default_ttl_secs: DEFAULT_TTL_SECS,
            sweep_interval_secs: 300,
            legacy_invalid_ttl: false,
        }
    }
}

impl ServerConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        if !self.base_path.starts_with('/') {
            return Err(ServerError::Config(format!(
                "base_path must start with '/': {:?}",
                self.base_path
            )));
        }
        if self.base_path.len() > 1 && self.base_path.ends_with('/') {
            return Err(ServerError::Config(format!(
                "base_path must not end with '/': {:?}",
                self.base_path
            )));
        }
        if self.default_ttl_secs == 0 {
            return Err(ServerError::Config(
                "default_ttl_secs of 0 would expire every share on arrival".into(),
            ));
        }
        Ok(())
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_snapshot_path(&self.snapshot_path)
            .with_max_payload_bytes(self.max_payload_bytes)
            .with_default_ttl_secs(self.default_ttl_secs)
    }

    /// Largest request body accepted by the HTTP layer.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_payload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES))
            .unwrap_or(usize::MAX)
    }
}
