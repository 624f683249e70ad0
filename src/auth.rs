//! Session identity.
//!
//! The order core only ever asks one question of the session: who is signed
//! in. [`CurrentUser`] is that seam; [`AuthContext`] is the in-process
//! implementation.

use mockall::automock;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::info;

use crate::{
    orders::OrderStore,
    users::{User, UserId},
};

/// Errors raised while signing in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user is registered with this email.
    #[error("no user registered with email {0}")]
    UnknownUser(String),
}

/// Identity of the signed-in user, if any.
#[automock]
pub trait CurrentUser: Send + Sync {
    /// Id of the signed-in user.
    fn current_user_id(&self) -> Option<UserId>;
}

/// Login state for a single client session.
#[derive(Debug, Default)]
pub struct AuthContext {
    user: RwLock<Option<User>>,
}

impl AuthContext {
    /// Create a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in as the user registered under `email`, replacing any current user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownUser`] if the store has no such user.
    pub fn login(&self, store: &OrderStore, email: &str) -> Result<User, AuthError> {
        let user = store
            .user_by_email(email)
            .ok_or_else(|| AuthError::UnknownUser(email.to_string()))?;

        info!(user = %user.id, role = ?user.role, "signed in");

        *self.user.write() = Some(user.clone());

        Ok(user)
    }

    /// Sign out. Does nothing when nobody is signed in.
    pub fn logout(&self) {
        if let Some(user) = self.user.write().take() {
            info!(user = %user.id, "signed out");
        }
    }

    /// Whether a user is signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.read().is_some()
    }

    /// The signed-in user.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.user.read().clone()
    }
}

impl CurrentUser for AuthContext {
    fn current_user_id(&self) -> Option<UserId> {
        self.user.read().as_ref().map(|user| user.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{fixtures::SeedData, users::Role};

    use super::*;

    #[test]
    fn login_and_logout_toggle_session() -> TestResult {
        let store = OrderStore::from_seed(&SeedData::bundled()?);
        let auth = AuthContext::new();

        assert!(!auth.is_authenticated());

        let user = auth.login(&store, "priya@example.com")?;

        assert!(auth.is_authenticated());
        assert_eq!(user.role, Role::Customer);
        assert_eq!(auth.current_user_id(), Some(user.id));

        auth.logout();

        assert!(!auth.is_authenticated());
        assert_eq!(auth.current_user_id(), None);

        Ok(())
    }

    #[test]
    fn login_is_case_insensitive_on_email() -> TestResult {
        let store = OrderStore::from_seed(&SeedData::bundled()?);
        let auth = AuthContext::new();

        let user = auth.login(&store, "PRIYA@example.com")?;

        assert_eq!(user.email, "priya@example.com");

        Ok(())
    }

    #[test]
    fn login_unknown_email_leaves_session_signed_out() -> TestResult {
        let store = OrderStore::from_seed(&SeedData::bundled()?);
        let auth = AuthContext::new();

        let result = auth.login(&store, "nobody@example.com");

        assert!(
            matches!(result, Err(AuthError::UnknownUser(_))),
            "expected UnknownUser, got {result:?}"
        );
        assert!(!auth.is_authenticated());

        Ok(())
    }
}
