//! `stockroom-auth`: authentication and role checks.
//!
//! This crate is intentionally decoupled from HTTP (except the optional
//! `remote` authenticator) and from storage.

pub mod authorize;
pub mod credential;
#[cfg(feature = "remote")]
pub mod remote;
pub mod roles;
pub mod session;
pub mod user;

pub use authorize::{require_role, Actor, AuthError};
pub use credential::{Credential, CredentialHasher};
#[cfg(feature = "remote")]
pub use remote::{RemoteAuthenticator, RemoteSession};
pub use roles::Role;
pub use session::{Authenticator, LocalAuthenticator, SessionGuard, SessionState};
pub use user::{NewUser, ProvisionError, User, UserDirectory};
