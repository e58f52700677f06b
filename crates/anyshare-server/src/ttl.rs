//! Interpretation of the `ttl` request parameter.
//!
//! Absent (or empty) means "use the configured default". A present value
//! must be a positive integer number of seconds. Anything else is rejected,
//! unless the server runs with `legacy_invalid_ttl`, which reproduces the
//! older behaviour of accepting the request with ttl 0, i.e. a share that
//! expires one second after creation.

use anyshare_registry::RegistryError;
use tracing::warn;

/// Resolve a raw `ttl` parameter to the value passed to the registry.
pub fn resolve_ttl(raw: Option<&str>, legacy_invalid_ttl: bool) -> Result<Option<i64>, RegistryError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i64>() {
        Ok(ttl) if ttl > 0 => Ok(Some(ttl)),
        _ if legacy_invalid_ttl => {
            warn!(ttl = raw, "invalid ttl, falling back to 0");
            Ok(Some(0))
        }
        _ => Err(RegistryError::InvalidInput(format!(
            "ttl must be a positive integer, got {raw:?}"
        ))),
    }
}
