//! HTTP server for anyShare.
//!
//! Exposes the object registry over a small HTTP surface: multipart upload,
//! download by id, and text shares passed in the query string. Every route
//! lives under a configurable base path (`/anyShare` by default).
//!
//! | Method     | Path        | Result                                   |
//! |------------|-------------|------------------------------------------|
//! | `POST`     | `/upload`   | `{"id": ...}` for the first file field   |
//! | `GET`      | `/download` | raw text or file bytes for `?id=`        |
//! | `GET/POST` | `/text`     | `{"id": ...}` for `?text=`               |
//! | `GET`      | `/health`   | liveness probe                           |
//! | `GET`      | `/info`     | version and record count                 |
//!
//! Errors are JSON `{"error": ...}` bodies with 400 for bad input, 404 for
//! unknown ids, 410 for expired ones and 500 otherwise. Extractor rejections
//! (malformed query strings, non-multipart uploads, bodies past the request
//! limit) go through the same [`ServerError`] path and answer 400 in the
//! same shape.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod ttl;

pub use config::{ServerConfig, MULTIPART_OVERHEAD_BYTES};
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::{shutdown_signal, AnyshareServer};
