use std::path::PathBuf;

/// Largest accepted payload, in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 100 * 1000 * 1000;

/// TTL applied when the caller does not supply one: two hours.
pub const DEFAULT_TTL_SECS: i64 = 2 * 60 * 60;

/// Snapshot location used when none is configured.
pub const DEFAULT_SNAPSHOT_PATH: &str = "tmp_file_map.json";

/// Configuration for a [`Registry`](crate::Registry).
///
/// # Example
///
/// ```rust
/// use anyshare_registry::RegistryConfig;
///
/// let config = RegistryConfig::default()
///     .with_snapshot_path("/var/lib/anyshare/index.json")
///     .with_max_payload_bytes(10 * 1000 * 1000);
/// assert_eq!(config.default_ttl_secs, 7200);
/// ```
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    /// Where the index is loaded from at startup and saved to at shutdown.
    pub snapshot_path: PathBuf,
    /// Uploads (and texts) longer than this are rejected.
    pub max_payload_bytes: u64,
    /// TTL used when a create call passes `None`.
    pub default_ttl_secs: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    pub fn with_max_payload_bytes(mut self, max: u64) -> Self {
        self.max_payload_bytes = max;
        self
    }

    pub fn with_default_ttl_secs(mut self, ttl: i64) -> Self {
        self.default_ttl_secs = ttl;
        self
    }
}
