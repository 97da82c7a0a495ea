use thiserror::Error;

use stockroom_auth::{AuthError, ProvisionError};
use stockroom_core::DomainError;
use stockroom_infra::StoreError;

/// Failure of a facade operation.
///
/// Carries the structured cause; turning it into user-facing text is the
/// presentation layer's job. [`AppError::code`] gives a stable machine code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProvisionError> for AppError {
    fn from(value: ProvisionError) -> Self {
        match value {
            ProvisionError::Domain(e) => AppError::Domain(e),
            ProvisionError::Auth(e) => AppError::Auth(e),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::Validation { .. }) => "validation_error",
            AppError::Domain(DomainError::NotFound { .. }) => "not_found",
            AppError::Domain(DomainError::Conflict { .. }) => "conflict",
            AppError::Domain(DomainError::InsufficientStock { .. }) => "insufficient_stock",
            AppError::Domain(DomainError::InvalidId(_)) => "invalid_id",
            AppError::Auth(AuthError::InvalidCredentials) => "invalid_credentials",
            AppError::Auth(AuthError::Forbidden { .. }) => "forbidden",
            AppError::Auth(AuthError::Unauthenticated) => "unauthenticated",
            AppError::Auth(AuthError::Hash(_)) => "credential_error",
            AppError::Auth(AuthError::Remote(_)) => "auth_service_error",
            AppError::Store(_) => "store_error",
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            AppError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_auth::Role;
    use stockroom_core::EntityKind;

    #[test]
    fn codes_follow_the_cause() {
        let forbidden: AppError = AuthError::Forbidden {
            required: Role::Admin,
            actual: Role::User,
        }
        .into();
        assert_eq!(forbidden.code(), "forbidden");

        let missing: AppError = DomainError::not_found(EntityKind::Item, "x").into();
        assert_eq!(missing.code(), "not_found");
        assert!(missing.as_domain().is_some());
    }

    #[test]
    fn provision_errors_unwrap_into_their_cause() {
        let err: AppError = ProvisionError::Domain(DomainError::validation("email", "bad")).into();
        assert_eq!(err.code(), "validation_error");
    }
}
