//! Session context and token storage
//!
//! The session is a single opaque bearer token in durable local storage.
//! Presence implies authenticated, absence implies anonymous; there is no
//! client-side expiry or refresh logic. An expired-but-present token is
//! only detected reactively, when the backend rejects the first request.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use opsdeck_core::{ErrorContext, OpsdeckError, OpsdeckResult};
use tracing::debug;

/// Storage for the session token
pub trait TokenStore: Send + Sync {
    /// Read the stored token, if any
    fn load(&self) -> Option<String>;

    /// Persist a token, replacing any previous one
    fn store(&self, token: &str) -> OpsdeckResult<()>;

    /// Delete the stored token. Idempotent: clearing an absent token is
    /// the normal logged-out state, not an error.
    fn clear(&self) -> OpsdeckResult<()>;
}

/// File-backed token store at a fixed path under the platform data dir.
///
/// This file is the client's only persisted state.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(_) => None,
        }
    }

    fn store(&self, token: &str) -> OpsdeckResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OpsdeckError::Storage {
                message: format!("Failed to create token directory: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("token_store").with_operation("store"),
            })?;
        }
        std::fs::write(&self.path, token).map_err(|e| OpsdeckError::Storage {
            message: format!("Failed to write token file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("token_store").with_operation("store"),
        })
    }

    fn clear(&self) -> OpsdeckResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OpsdeckError::Storage {
                message: format!("Failed to delete token file: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("token_store").with_operation("clear"),
            }),
        }
    }
}

/// In-memory token store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    fn store(&self, token: &str) -> OpsdeckResult<()> {
        *self.token.write().expect("token lock poisoned") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> OpsdeckResult<()> {
        *self.token.write().expect("token lock poisoned") = None;
        Ok(())
    }
}

/// Explicit session object shared by the API client and the navigation
/// guard.
///
/// Teardown happens through exactly two entry points: the API client's
/// unauthorized policy and an explicit logout. Both funnel through
/// [`SessionContext::teardown`]. Token access is not atomic across
/// concurrent requests; a race between a success and a concurrent
/// unauthorized-triggered teardown converges to logged-out.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn TokenStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// In-memory session, used by tests and one-shot invocations
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// File-backed session at the given token path
    pub fn persistent(path: PathBuf) -> Self {
        Self::new(Arc::new(FileTokenStore::new(path)))
    }

    /// The stored credential, if present
    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    /// Whether a credential is present ("authenticated" in the advisory,
    /// client-side sense)
    pub fn is_authenticated(&self) -> bool {
        self.store.load().is_some()
    }

    /// Store a fresh credential after login
    pub fn establish(&self, token: &str) -> OpsdeckResult<()> {
        debug!("Session established");
        self.store.store(token)
    }

    /// Delete the stored credential. Idempotent.
    pub fn teardown(&self) -> OpsdeckResult<()> {
        debug!("Session teardown");
        self.store.clear()
    }
}
