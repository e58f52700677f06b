//! Catalog entry for one stored item.

use serde::{Deserialize, Deserializer, Serialize};

use crate::id::ShareId;

/// Metadata (and optionally the payload) of one stored item.
///
/// Field names on the wire match the snapshot format used by earlier
/// deployments (`filename`, `expired_time`, `text`), so existing snapshot
/// files load unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Unique identifier, immutable once assigned.
    pub id: ShareId,
    /// Original filename; empty for text shares.
    #[serde(rename = "filename", default)]
    pub display_name: String,
    /// Byte length of the payload or text.
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Creation time in seconds since the UNIX epoch.
    pub created_at: i64,
    /// Seconds from `created_at` until expiry. Negative never expires;
    /// zero lapses one second after creation.
    #[serde(rename = "expired_time")]
    pub ttl_seconds: i64,
    /// Inline payload for text shares. When present no backing file exists.
    #[serde(
        rename = "text",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub inline_text: Option<String>,
}

impl ObjectRecord {
    /// Record for an uploaded file whose bytes live in the object store.
    pub fn file(
        id: ShareId,
        display_name: impl Into<String>,
        size_bytes: u64,
        created_at: i64,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            size_bytes,
            created_at,
            ttl_seconds,
            inline_text: None,
        }
    }

    /// Record for a text share; the text is kept inline.
    pub fn text(id: ShareId, text: impl Into<String>, created_at: i64, ttl_seconds: i64) -> Self {
        let text = text.into();
        Self {
            id,
            display_name: String::new(),
            size_bytes: text.len() as u64,
            created_at,
            ttl_seconds,
            inline_text: Some(text),
        }
    }

    /// Returns `true` if the payload is stored inline rather than in the
    /// object store.
    pub fn is_inline(&self) -> bool {
        self.inline_text.is_some()
    }

    /// Returns `true` if the record never expires.
    pub fn is_permanent(&self) -> bool {
        self.ttl_seconds < 0
    }

    /// Expiry instant in epoch seconds, or `None` for permanent records.
    ///
    /// The record is still live *at* this instant and expired strictly
    /// after it.
    pub fn expires_at(&self) -> Option<i64> {
        if self.is_permanent() {
            None
        } else {
            Some(self.created_at.saturating_add(self.ttl_seconds))
        }
    }

    /// Expiration predicate: `ttl >= 0 && created_at + ttl < now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|deadline| deadline < now)
    }
}

/// Snapshots written by older deployments always carry a `text` key, empty
/// for uploaded files.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text.filter(|t| !t.is_empty()))
}
