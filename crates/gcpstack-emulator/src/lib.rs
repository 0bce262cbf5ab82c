//! In-memory object storage and database admin emulator for GcpStack.
//!
//! The emulator owns one consistent dataset of buckets, objects, database
//! instances, databases, users, and the operation log, and serves it through
//! the [`gcpstack_http`] routing layer.
//!
//! # Architecture
//!
//! ```text
//! gcpstack-http (routing, body collection, error envelopes)
//!        |
//!        v
//! GcpEmulatorHandler (decode request, shape response)
//!        |
//!        v
//! GcpEmulator::handle_* (validation, per-family operations)
//!        |
//!        v
//!   GcpStore (single RwLock over all resources + operation log)
//! ```

#![allow(clippy::result_large_err)]

pub mod checksums;
pub mod error;
pub mod handler;
pub mod listing;
mod ops;
pub mod provider;
pub mod state;
pub mod utils;
pub mod validation;

pub use handler::GcpEmulatorHandler;
pub use provider::GcpEmulator;
pub use state::GcpStore;
