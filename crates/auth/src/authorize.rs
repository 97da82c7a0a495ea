use thiserror::Error;

use stockroom_core::UserId;

use crate::{Role, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown email or wrong credential (indistinguishable on purpose).
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden: requires role '{required}', has '{actual}'")]
    Forbidden { required: Role, actual: Role },

    #[error("no authenticated session")]
    Unauthenticated,

    #[error("credential hashing failed: {0}")]
    Hash(String),

    #[error("remote authentication failed: {0}")]
    Remote(String),
}

/// The user on whose behalf an operation runs.
///
/// Passed explicitly to every mutating operation instead of being read from
/// ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id, user.role)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn require(&self, role: Role) -> Result<(), AuthError> {
        check(self.role, role)
    }
}

/// Fails with `Forbidden` unless `user.role == role`.
///
/// - No IO
/// - No panics
pub fn require_role(user: &User, role: Role) -> Result<(), AuthError> {
    check(user.role, role)
}

fn check(actual: Role, required: Role) -> Result<(), AuthError> {
    if actual == required {
        Ok(())
    } else {
        tracing::debug!(%required, %actual, "role check failed");
        Err(AuthError::Forbidden { required, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: format!("{role}@inventory.com"),
            name: "Someone".to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn admin_requirement_rejects_regular_users() {
        let err = require_role(&user(Role::User), Role::Admin).unwrap_err();
        assert_eq!(
            err,
            AuthError::Forbidden {
                required: Role::Admin,
                actual: Role::User
            }
        );
    }

    #[test]
    fn admin_requirement_accepts_admins() {
        assert!(require_role(&user(Role::Admin), Role::Admin).is_ok());
    }

    #[test]
    fn actor_carries_the_users_role() {
        let admin = user(Role::Admin);
        let actor = Actor::from_user(&admin);
        assert_eq!(actor.user_id(), admin.id);
        assert!(actor.require(Role::Admin).is_ok());
        assert!(Actor::from_user(&user(Role::User)).require(Role::Admin).is_err());
    }
}
