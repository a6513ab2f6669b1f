use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::ApiClient;
use crate::error::AuthError;
use crate::storage::UserProfile;

/// Token and profile handed out by a successful sign-in or sign-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthGrant {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    success: bool,
    token: Option<String>,
    user: Option<UserProfile>,
    message: Option<String>,
}

impl ApiClient {
    /// `POST auth/signup`.
    ///
    /// # Errors
    /// [`AuthError::Rejected`] with the service's message when it refuses,
    /// [`AuthError::Transport`] when it cannot be reached or answers with
    /// something unreadable.
    pub async fn signup(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError> {
        self.authenticate("auth/signup", email, password, "Sign up failed")
            .await
    }

    /// `POST auth/signin`.
    ///
    /// # Errors
    /// Same as [`ApiClient::signup`].
    pub async fn signin(&self, email: &str, password: &str) -> Result<AuthGrant, AuthError> {
        self.authenticate("auth/signin", email, password, "Sign in failed")
            .await
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
        fallback: &str,
    ) -> Result<AuthGrant, AuthError> {
        let url = self
            .endpoint(path)
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let body = AuthRequest {
            email: email.trim(),
            password,
        };
        let resp = self
            .send(Method::POST, url, Some(&body))
            .await
            .map_err(AuthError::Transport)?;

        if resp.status.is_server_error() {
            return Err(AuthError::Transport(
                resp.message()
                    .unwrap_or_else(|| format!("{fallback} ({})", resp.status)),
            ));
        }
        let parsed: AuthResponse = serde_json::from_str(&resp.body)
            .map_err(|e| AuthError::Transport(format!("unreadable response: {e}")))?;

        match parsed {
            AuthResponse {
                success: true,
                token: Some(token),
                user: Some(user),
                ..
            } if resp.status.is_success() && !token.is_empty() => Ok(AuthGrant { token, user }),
            AuthResponse { message, .. } => {
                Err(AuthError::Rejected(message.unwrap_or_else(|| fallback.to_string())))
            }
        }
    }
}
