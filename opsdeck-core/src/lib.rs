//! Opsdeck Core - shared data structures for the admin console client
//!
//! This crate defines the domain types, error handling, configuration, and
//! logging bootstrap used across the opsdeck workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
