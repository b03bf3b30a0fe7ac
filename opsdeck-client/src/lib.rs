//! Opsdeck Client - session context and HTTP API client
//!
//! This crate owns the two pieces that talk to the outside world:
//!
//! - [`SessionContext`]: the explicit session object holding the stored
//!   bearer token, with a single teardown operation.
//! - [`ApiClient`]: a reqwest wrapper over the backend's resource groups
//!   (auth, users, config) that injects the bearer token and enforces the
//!   global unauthorized policy.

pub mod api;
pub mod session;

pub use api::{ApiClient, ApiClientConfig};
pub use session::{FileTokenStore, MemoryTokenStore, SessionContext, TokenStore};
