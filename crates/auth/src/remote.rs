//! Delegated authentication against an HTTP login endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{AuthError, Authenticator, User};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password_hash: &'a str,
}

/// Session payload returned by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSession {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
}

/// Posts `{email, password_hash}` to a login endpoint; any 2xx answer carrying
/// a session payload is a successful login.
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    client: reqwest::blocking::Client,
    login_url: String,
}

impl RemoteAuthenticator {
    pub fn new(login_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Remote(e.to_string()))?;
        Ok(Self {
            client,
            login_url: login_url.into(),
        })
    }

    pub fn login(&self, email: &str, credential: &str) -> Result<RemoteSession, AuthError> {
        let response = self
            .client
            .post(&self.login_url)
            .json(&LoginRequest {
                email,
                password_hash: credential,
            })
            .send()
            .map_err(|e| AuthError::Remote(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::Remote(format!("login endpoint returned {status}")));
        }

        response
            .json::<RemoteSession>()
            .map_err(|e| AuthError::Remote(e.to_string()))
    }
}

impl Authenticator for RemoteAuthenticator {
    fn authenticate(&self, email: &str, credential: &str) -> Result<User, AuthError> {
        let session = self.login(email, credential)?;
        tracing::debug!(user_id = %session.user.id, has_token = session.token.is_some(), "remote login accepted");
        Ok(session.user)
    }
}
