//! User records and the directory that resolves them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, EntityKind, UserId};

use crate::credential::{Credential, CredentialHasher};
use crate::{AuthError, Role};

/// Account identity. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Entity for User {
    type Id = UserId;
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for provisioning an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: String,
}

const MIN_PASSWORD_LEN: usize = 8;

/// Users plus their credentials.
///
/// Email lookups ignore case.
#[derive(Debug)]
pub struct UserDirectory {
    hasher: CredentialHasher,
    users: RwLock<BTreeMap<UserId, User>>,
    credentials: RwLock<HashMap<UserId, String>>,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new(CredentialHasher::default())
    }
}

impl UserDirectory {
    pub fn new(hasher: CredentialHasher) -> Self {
        Self::from_tables(hasher, Vec::new(), Vec::new())
    }

    pub fn from_tables(hasher: CredentialHasher, users: Vec<User>, credentials: Vec<Credential>) -> Self {
        Self {
            hasher,
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
            credentials: RwLock::new(
                credentials
                    .into_iter()
                    .map(|c| (c.user_id, c.password_hash))
                    .collect(),
            ),
        }
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    pub fn get(&self, id: UserId) -> DomainResult<User> {
        read(&self.users)
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(EntityKind::User, id))
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        let wanted = email.trim().to_lowercase();
        read(&self.users)
            .values()
            .find(|u| u.email.to_lowercase() == wanted)
            .cloned()
    }

    pub fn list(&self) -> Vec<User> {
        read(&self.users).values().cloned().collect()
    }

    pub fn credentials(&self) -> Vec<Credential> {
        let mut out: Vec<Credential> = read(&self.credentials)
            .iter()
            .map(|(user_id, password_hash)| Credential {
                user_id: *user_id,
                password_hash: password_hash.clone(),
            })
            .collect();
        out.sort_by_key(|c| c.user_id);
        out
    }

    pub(crate) fn password_hash(&self, id: UserId) -> Option<String> {
        read(&self.credentials).get(&id).cloned()
    }

    /// Create an account with a hashed credential.
    pub fn provision(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, ProvisionError> {
        let email = new.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email", "must be an email address").into());
        }
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("name", "cannot be empty").into());
        }
        if new.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            )
            .into());
        }
        let password_hash = self.hasher.hash(&new.password)?;

        let mut users = write(&self.users);
        let wanted = email.to_lowercase();
        if let Some(existing) = users.values().find(|u| u.email.to_lowercase() == wanted) {
            return Err(DomainError::conflict(EntityKind::User, existing.id, "email already registered").into());
        }
        let user = User {
            id: UserId::new(),
            email,
            name: new.name.trim().to_string(),
            role: new.role,
            created_at: now,
        };
        users.insert(user.id, user.clone());
        write(&self.credentials).insert(user.id, password_hash);
        tracing::info!(user_id = %user.id, role = %user.role, "user provisioned");
        Ok(user)
    }

    /// Record an account resolved elsewhere (a remote login) so later lookups
    /// and session restores find it. Returns whether anything changed.
    ///
    /// Fails with `Conflict` when a different account already holds the email.
    pub fn remember(&self, user: &User) -> DomainResult<bool> {
        let mut users = write(&self.users);
        let wanted = user.email.trim().to_lowercase();
        if let Some(other) = users
            .values()
            .find(|u| u.id != user.id && u.email.to_lowercase() == wanted)
        {
            return Err(DomainError::conflict(EntityKind::User, other.id, "email already registered"));
        }
        if users.get(&user.id) == Some(user) {
            return Ok(false);
        }
        users.insert(user.id, user.clone());
        tracing::info!(user_id = %user.id, role = %user.role, "external account recorded");
        Ok(true)
    }

    /// Replace (or set) a user's credential.
    pub fn set_password(&self, id: UserId, password: &str) -> Result<(), ProvisionError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            )
            .into());
        }
        if !read(&self.users).contains_key(&id) {
            return Err(DomainError::not_found(EntityKind::User, id).into());
        }
        let password_hash = self.hasher.hash(password)?;
        write(&self.credentials).insert(id, password_hash);
        tracing::info!(user_id = %id, "credential updated");
        Ok(())
    }
}

/// Provisioning fails on bad input (domain) or on hashing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        UserDirectory::new(CredentialHasher::with_cost(64, 1).unwrap())
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Regular User".to_string(),
            role: Role::User,
            password: "hunter22hunter".to_string(),
        }
    }

    #[test]
    fn provision_stores_a_hash_not_the_password() {
        let dir = directory();
        let user = dir.provision(new_user("user@inventory.com"), Utc::now()).unwrap();
        let stored = dir.password_hash(user.id).unwrap();
        assert!(!stored.contains("hunter22hunter"));
        assert!(dir.hasher().verify("hunter22hunter", &stored).unwrap());
    }

    #[test]
    fn email_lookup_ignores_case() {
        let dir = directory();
        let user = dir.provision(new_user("User@Inventory.com"), Utc::now()).unwrap();
        assert_eq!(dir.find_by_email("user@inventory.COM"), Some(user));
    }

    #[test]
    fn duplicate_email_conflicts() {
        let dir = directory();
        dir.provision(new_user("user@inventory.com"), Utc::now()).unwrap();
        let err = dir
            .provision(new_user("USER@inventory.com"), Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Domain(DomainError::Conflict { entity: EntityKind::User, .. })
        ));
        assert_eq!(dir.list().len(), 1);
    }

    #[test]
    fn short_password_is_rejected_before_hashing() {
        let dir = directory();
        let mut new = new_user("user@inventory.com");
        new.password = "short".to_string();
        let err = dir.provision(new, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Domain(DomainError::Validation { field: "password", .. })
        ));
        assert!(dir.credentials().is_empty());
    }

    #[test]
    fn set_password_replaces_the_credential() {
        let dir = directory();
        let user = dir.provision(new_user("user@inventory.com"), Utc::now()).unwrap();
        dir.set_password(user.id, "another-secret").unwrap();

        let stored = dir.password_hash(user.id).unwrap();
        assert!(dir.hasher().verify("another-secret", &stored).unwrap());
        assert!(!dir.hasher().verify("hunter22hunter", &stored).unwrap());

        assert!(matches!(
            dir.set_password(UserId::new(), "another-secret"),
            Err(ProvisionError::Domain(DomainError::NotFound { .. }))
        ));
        assert!(matches!(
            dir.set_password(user.id, "short"),
            Err(ProvisionError::Domain(DomainError::Validation { field: "password", .. }))
        ));
    }

    #[test]
    fn remember_adds_or_refreshes_external_accounts() {
        let dir = directory();
        let mut remote = User {
            id: UserId::new(),
            email: "remote@inventory.com".to_string(),
            name: "Remote User".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        assert!(dir.remember(&remote).unwrap());
        assert!(!dir.remember(&remote).unwrap());
        assert_eq!(dir.get(remote.id).unwrap(), remote);

        remote.role = Role::Admin;
        assert!(dir.remember(&remote).unwrap());
        assert_eq!(dir.get(remote.id).unwrap().role, Role::Admin);
        assert!(dir.credentials().is_empty());

        let local = dir.provision(new_user("user@inventory.com"), Utc::now()).unwrap();
        let impostor = User {
            id: UserId::new(),
            email: local.email.to_uppercase(),
            ..remote
        };
        assert!(matches!(
            dir.remember(&impostor),
            Err(DomainError::Conflict { entity: EntityKind::User, .. })
        ));
    }

    #[test]
    fn user_json_has_no_secret_fields() {
        let dir = directory();
        let user = dir.provision(new_user("user@inventory.com"), Utc::now()).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("createdAt").is_some());
    }
}
