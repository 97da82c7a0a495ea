//! Session guard: who is signed in, and how they got there.

use std::sync::{Arc, OnceLock};

use stockroom_core::UserId;

use crate::{Actor, AuthError, User, UserDirectory};

/// Verifies an email + credential pair and resolves the account.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, email: &str, credential: &str) -> Result<User, AuthError>;
}

impl<A> Authenticator for Arc<A>
where
    A: Authenticator + ?Sized,
{
    fn authenticate(&self, email: &str, credential: &str) -> Result<User, AuthError> {
        (**self).authenticate(email, credential)
    }
}

/// Checks credentials against the hashes held by a [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct LocalAuthenticator {
    directory: Arc<UserDirectory>,
}

impl LocalAuthenticator {
    pub fn new(directory: Arc<UserDirectory>) -> Self {
        Self { directory }
    }

    /// Hash verified when the email is unknown, so both failure paths cost the same.
    fn decoy_hash(&self) -> Option<&'static str> {
        static DECOY: OnceLock<Option<String>> = OnceLock::new();
        DECOY
            .get_or_init(|| self.directory.hasher().hash("decoy-credential").ok())
            .as_deref()
    }
}

impl Authenticator for LocalAuthenticator {
    fn authenticate(&self, email: &str, credential: &str) -> Result<User, AuthError> {
        let user = self.directory.find_by_email(email);
        let stored = user
            .as_ref()
            .and_then(|u| self.directory.password_hash(u.id));

        let verified = match (&user, stored) {
            (Some(_), Some(hash)) => self.directory.hasher().verify(credential, &hash)?,
            _ => {
                if let Some(decoy) = self.decoy_hash() {
                    let _ = self.directory.hasher().verify(credential, decoy);
                }
                false
            }
        };

        match user {
            Some(user) if verified => Ok(user),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Session lifecycle: `Anonymous` until a successful login, back to
/// `Anonymous` on logout or when a saved session no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(User),
}

/// Holds the signed-in user for one client.
///
/// This is an explicit value owned by the caller rather than process-wide
/// state; hand [`SessionGuard::actor`] to the operations that need it.
pub struct SessionGuard {
    authenticator: Arc<dyn Authenticator>,
    directory: Arc<UserDirectory>,
    state: SessionState,
}

impl core::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    /// Guard that verifies credentials locally against `directory`.
    pub fn local(directory: Arc<UserDirectory>) -> Self {
        let authenticator = Arc::new(LocalAuthenticator::new(Arc::clone(&directory)));
        Self::new(authenticator, directory)
    }

    pub fn new(authenticator: Arc<dyn Authenticator>, directory: Arc<UserDirectory>) -> Self {
        Self {
            authenticator,
            directory,
            state: SessionState::Anonymous,
        }
    }

    /// On failure the current state is left as it was.
    pub fn authenticate(&mut self, email: &str, credential: &str) -> Result<User, AuthError> {
        match self.authenticator.authenticate(email, credential) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
                self.state = SessionState::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                Err(e)
            }
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Acting context for the signed-in user.
    pub fn actor(&self) -> Result<Actor, AuthError> {
        self.current_user()
            .map(Actor::from_user)
            .ok_or(AuthError::Unauthenticated)
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated(user) = &self.state {
            tracing::info!(user_id = %user.id, "logged out");
        }
        self.state = SessionState::Anonymous;
    }

    /// Resume a persisted session. Unknown users fall back to `Anonymous`.
    pub fn restore(&mut self, saved: Option<UserId>) -> Option<&User> {
        self.state = match saved.map(|id| self.directory.get(id)) {
            Some(Ok(user)) => SessionState::Authenticated(user),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "saved session no longer resolves; signing out");
                SessionState::Anonymous
            }
            None => SessionState::Anonymous,
        };
        self.current_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CredentialHasher, NewUser, Role};
    use chrono::Utc;

    fn directory_with(email: &str, role: Role, password: &str) -> (Arc<UserDirectory>, User) {
        let dir = Arc::new(UserDirectory::new(CredentialHasher::with_cost(64, 1).unwrap()));
        let user = dir
            .provision(
                NewUser {
                    email: email.to_string(),
                    name: "Admin User".to_string(),
                    role,
                    password: password.to_string(),
                },
                Utc::now(),
            )
            .unwrap();
        (dir, user)
    }

    #[test]
    fn login_then_logout_walks_the_state_machine() {
        let (dir, admin) = directory_with("admin@inventory.com", Role::Admin, "s3cret-pass");
        let mut guard = SessionGuard::local(dir);
        assert_eq!(guard.state(), &SessionState::Anonymous);
        assert_eq!(guard.actor(), Err(AuthError::Unauthenticated));

        let user = guard.authenticate("admin@inventory.com", "s3cret-pass").unwrap();
        assert_eq!(user, admin);
        assert_eq!(guard.current_user(), Some(&admin));
        assert_eq!(guard.actor().unwrap().role(), Role::Admin);

        guard.logout();
        assert!(guard.current_user().is_none());
    }

    #[test]
    fn fixed_placeholder_password_is_not_accepted() {
        let (dir, _) = directory_with("admin@inventory.com", Role::Admin, "s3cret-pass");
        let mut guard = SessionGuard::local(dir);
        let err = guard.authenticate("admin@inventory.com", "password").unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(guard.current_user().is_none());
    }

    #[test]
    fn unknown_email_and_wrong_password_look_the_same() {
        let (dir, _) = directory_with("admin@inventory.com", Role::Admin, "s3cret-pass");
        let auth = LocalAuthenticator::new(dir);
        assert_eq!(
            auth.authenticate("nobody@inventory.com", "s3cret-pass"),
            auth.authenticate("admin@inventory.com", "wrong-pass")
        );
    }

    #[test]
    fn user_without_credential_cannot_log_in() {
        let user = User {
            id: UserId::new(),
            email: "user@inventory.com".to_string(),
            name: "Regular User".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let dir = Arc::new(UserDirectory::from_tables(
            CredentialHasher::with_cost(64, 1).unwrap(),
            vec![user],
            vec![],
        ));
        let mut guard = SessionGuard::local(dir);
        assert!(guard.authenticate("user@inventory.com", "").is_err());
    }

    #[test]
    fn failed_login_keeps_existing_session() {
        let (dir, admin) = directory_with("admin@inventory.com", Role::Admin, "s3cret-pass");
        let mut guard = SessionGuard::local(dir);
        guard.authenticate("admin@inventory.com", "s3cret-pass").unwrap();
        assert!(guard.authenticate("admin@inventory.com", "nope").is_err());
        assert_eq!(guard.current_user(), Some(&admin));
    }

    struct FixedAuthenticator(User);

    impl Authenticator for FixedAuthenticator {
        fn authenticate(&self, _email: &str, _credential: &str) -> Result<User, AuthError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn remembered_external_login_can_be_restored() {
        let dir = Arc::new(UserDirectory::new(CredentialHasher::with_cost(64, 1).unwrap()));
        let outsider = User {
            id: UserId::new(),
            email: "remote@inventory.com".to_string(),
            name: "Remote User".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let auth: Arc<dyn Authenticator> = Arc::new(FixedAuthenticator(outsider.clone()));

        let mut guard = SessionGuard::new(Arc::clone(&auth), Arc::clone(&dir));
        let user = guard.authenticate("remote@inventory.com", "token").unwrap();
        assert_eq!(SessionGuard::new(Arc::clone(&auth), Arc::clone(&dir)).restore(Some(user.id)), None);

        dir.remember(&user).unwrap();
        let mut next = SessionGuard::new(auth, dir);
        assert_eq!(next.restore(Some(user.id)), Some(&outsider));
    }

    #[test]
    fn restore_resolves_known_users_only() {
        let (dir, admin) = directory_with("admin@inventory.com", Role::Admin, "s3cret-pass");
        let mut guard = SessionGuard::local(dir);

        assert_eq!(guard.restore(Some(admin.id)), Some(&admin));
        assert_eq!(guard.restore(Some(UserId::new())), None);
        assert_eq!(guard.state(), &SessionState::Anonymous);
        assert_eq!(guard.restore(None), None);
    }
}
