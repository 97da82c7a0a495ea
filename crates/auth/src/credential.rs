//! Salted password hashing (Argon2id, PHC string format).

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use stockroom_core::UserId;

use crate::AuthError;

/// Stored credential for one user. Kept apart from the `User` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub user_id: UserId,
    /// Argon2id PHC string; embeds salt and cost parameters.
    pub password_hash: String,
}

/// Hashes and verifies passwords.
///
/// Verification reads the cost parameters from the stored hash, so hashes
/// produced with other settings still verify.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl core::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl CredentialHasher {
    /// Custom cost: memory in KiB and number of passes.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Default cost with either parameter overridden.
    pub fn configured(memory_kib: Option<u32>, iterations: Option<u32>) -> Result<Self, AuthError> {
        match (memory_kib, iterations) {
            (None, None) => Ok(Self::default()),
            (m, t) => Self::with_cost(
                m.unwrap_or(Params::DEFAULT_M_COST),
                t.unwrap_or(Params::DEFAULT_T_COST),
            ),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hash(e.to_string()))?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password; `Err` only for an unreadable hash.
    ///
    /// The comparison inside `verify_password` is constant-time.
    pub fn verify(&self, password: &str, phc: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(phc).map_err(|e| AuthError::Hash(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hash(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::with_cost(64, 1).unwrap()
    }

    #[test]
    fn hash_verifies_only_the_hashed_password() {
        let h = hasher();
        let phc = h.hash("correct horse").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(h.verify("correct horse", &phc).unwrap());
        assert!(!h.verify("password", &phc).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let h = hasher();
        assert_ne!(h.hash("secret").unwrap(), h.hash("secret").unwrap());
    }

    #[test]
    fn verification_uses_parameters_from_the_hash() {
        let phc = hasher().hash("secret").unwrap();
        assert!(CredentialHasher::default().verify("secret", &phc).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        let err = hasher().verify("secret", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AuthError::Hash(_)));
    }
}
