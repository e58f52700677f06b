//! Foundation types for anyShare.
//!
//! anyShare is an ephemeral content store: clients upload a file or a text
//! blob, receive a short random identifier, and can retrieve the content
//! until it expires. Every other anyShare crate depends on `anyshare-types`.
//!
//! # Key Types
//!
//! - [`ShareId`] -- Short opaque identifier, safe to use as a storage key
//! - [`ObjectRecord`] -- Catalog entry for one stored item
//! - [`Clock`] -- Wall-clock source in whole epoch seconds
//! - [`SystemClock`] / [`ManualClock`] -- Production and test clocks

pub mod error;
pub mod id;
pub mod record;
pub mod temporal;

pub use error::TypeError;
pub use id::ShareId;
pub use record::ObjectRecord;
pub use temporal::{Clock, ManualClock, SystemClock};
