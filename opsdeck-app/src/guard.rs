//! Navigation guard for protected views
//!
//! A pure presence check over the session context: it does not validate
//! token contents or expiry. A missing token is the normal logged-out
//! state, not an error; a stale-but-present token is only caught
//! reactively by the API client's unauthorized policy.

use opsdeck_client::SessionContext;

/// Outcome of the guard check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// A credential is present; the protected view may mount
    Allow,
    /// No credential; send the user to the login entry point
    RedirectToLogin,
}

/// Gate a protected view on session presence
pub fn check_session(session: &SessionContext) -> Gate {
    if session.is_authenticated() {
        Gate::Allow
    } else {
        Gate::RedirectToLogin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_token_redirects() {
        let session = SessionContext::in_memory();
        assert_eq!(check_session(&session), Gate::RedirectToLogin);
    }

    #[test]
    fn present_token_allows() {
        let session = SessionContext::in_memory();
        session.establish("tok").unwrap();
        assert_eq!(check_session(&session), Gate::Allow);

        session.teardown().unwrap();
        assert_eq!(check_session(&session), Gate::RedirectToLogin);
    }
}
