//! # Taskboard Shared Library
//!
//! Shared types and the remote store contract used by the synchronization
//! layer and the application binary.
//!
//! ## Module Organization
//!
//! - `models`: Board, column and task rows, field patches, quadrant classification
//! - `store`: Remote store contract plus in-memory and HTTP (PostgREST) adapters
//! - `schema`: Probe-and-cache schema capability flags
//! - `session`: Identity/session provider
//! - `config`: Client configuration

pub mod config;
pub mod models;
pub mod schema;
pub mod session;
pub mod store;

/// Current version of the taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
