//! View state machines
//!
//! Each view owns a transient snapshot fetched on mount and discarded on
//! navigation away; there is no cross-view shared mutable state. Views
//! expose typed states for the presentation layer to render.

mod admin;
mod profile;

pub use admin::{AdminData, AdminTab, AdminView};
pub use profile::{ProfileData, ProfileView};

/// Typed view state produced by the capability check at view entry
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    /// Initial fetch in flight
    Loading,
    /// The caller lacks the capability this view requires
    AccessDenied,
    /// Snapshot loaded, view is interactive
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, ViewState::AccessDenied)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            ViewState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Inline user feedback shown by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == MessageKind::Success
    }
}
