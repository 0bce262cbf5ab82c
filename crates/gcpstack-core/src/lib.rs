//! Core types and configuration for GcpStack.
//!
//! This crate provides the pieces shared by every GcpStack crate: the
//! environment-driven [`GcpStackConfig`], the [`ProjectId`] identity the
//! emulator is scoped to, and the infrastructure error type.

mod config;
mod error;
mod types;

pub use config::{GcpStackConfig, LogFormat, parse_duration};
pub use error::{GcpStackError, GcpStackResult};
pub use types::ProjectId;
