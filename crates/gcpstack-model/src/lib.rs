//! Resource model and wire types for GcpStack.
//!
//! This crate defines every record the emulator serves, the request bodies it
//! accepts, the [`GcpOperation`] enum the router resolves requests to, and the
//! [`GcpError`](error::GcpError) wire error rendered into the nested
//! `{"error": {...}}` envelope.
//!
//! Field names follow the live JSON schemas (`camelCase`), integers the
//! schemas mark as strings are serialized as JSON strings, and timestamps are
//! RFC 3339 in UTC with a `Z` suffix.

pub mod error;
pub mod operations;
pub mod serde_util;
pub mod sql;
pub mod storage;

pub use error::{GcpError, GcpErrorCode};
pub use operations::{ApiFamily, GcpOperation};
