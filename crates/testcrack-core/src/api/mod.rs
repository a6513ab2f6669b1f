//! HTTP client for the Test Crack service.
//!
//! Every endpoint answers with a `{ success, data?, message? }` envelope
//! (sign-in and sign-up put `token`/`user` at the top level instead).
//! Status handling lives here; the endpoint modules only decide what a
//! failure means for their operation.

mod assessment;
mod auth;

pub use auth::AuthGrant;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ConfigError, GatewayError};
use crate::storage::Config;

/// Client for the assessment, auth and progress endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    token: Option<String>,
}

/// Response envelope shared by the service endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Raw outcome of one request, before the endpoint interprets it.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    /// Parse the body as an envelope; `None` when it is not JSON of that shape.
    pub fn envelope<T: DeserializeOwned>(&self) -> Option<Envelope<T>> {
        serde_json::from_str(&self.body).ok()
    }

    /// The service's `message` field, if the body carries one.
    pub fn message(&self) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()?
            .get("message")?
            .as_str()
            .map(str::to_string)
    }
}

impl ApiClient {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = normalize_base(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "api.timeout_secs".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            http,
            base_url,
            token: None,
        })
    }

    /// Build from configuration, attaching `token` when signed in.
    ///
    /// # Errors
    /// See [`ApiClient::new`].
    pub fn from_config(config: &Config, token: Option<&str>) -> Result<Self, ConfigError> {
        let client = Self::new(&config.effective_base_url(), config.request_timeout())?;
        Ok(match token {
            Some(token) => client.with_token(token),
            None => client,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// `GET user/progress`. The document is returned as the service sent it.
    ///
    /// # Errors
    /// [`GatewayError::Unauthorized`] on 401, otherwise
    /// [`GatewayError::ContentUnavailable`] for any failure.
    pub async fn user_progress(&self) -> Result<serde_json::Value, GatewayError> {
        let url = self.endpoint("user/progress")?;
        let resp = self
            .send(Method::GET, url, None::<&()>)
            .await
            .map_err(GatewayError::ContentUnavailable)?;
        if resp.status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Unauthorized);
        }
        if !resp.status.is_success() {
            return Err(GatewayError::ContentUnavailable(
                resp.message()
                    .unwrap_or_else(|| format!("progress request failed with {}", resp.status)),
            ));
        }
        let value: serde_json::Value = serde_json::from_str(&resp.body)
            .map_err(|e| GatewayError::ContentUnavailable(format!("malformed response: {e}")))?;
        match value.get("data") {
            Some(data) if value.get("success").is_some() => Ok(data.clone()),
            _ => Ok(value),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::ContentUnavailable(format!("bad endpoint {path}: {e}")))
    }

    /// Send one request. Only transport failures are errors here; every
    /// HTTP status comes back as a [`RawResponse`].
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<RawResponse, String> {
        tracing::debug!(%method, %url, "request");
        let mut req = self.http.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "request failed");
            format!("could not reach the service: {e}")
        })?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {e}"))?;
        if !status.is_success() {
            tracing::warn!(%method, %url, %status, "service returned an error status");
        }
        Ok(RawResponse { status, body })
    }
}

/// Parse and force a trailing slash so relative joins keep the path prefix
/// (`http://host/api` + `assessment/submit`).
fn normalize_base(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ConfigError::InvalidValue {
        key: "api.base_url".to_string(),
        message: format!("{raw}: {e}"),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue {
            key: "api.base_url".to_string(),
            message: format!("{raw} cannot be used as a base URL"),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = ApiClient::new("http://localhost:5000/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("assessment/content").unwrap().as_str(),
            "http://localhost:5000/api/assessment/content"
        );

        let client = ApiClient::new("http://localhost:5000/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("auth/signin").unwrap().as_str(),
            "http://localhost:5000/api/auth/signin"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = ApiClient::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "api.base_url"));
    }

    #[test]
    fn from_config_attaches_token() {
        let mut cfg = Config::default();
        cfg.api.base_url = "http://example.test/api".into();
        let client = ApiClient::from_config(&cfg, Some("tok")).unwrap();
        assert!(client.has_token());
        let anon = ApiClient::from_config(&cfg, None).unwrap();
        assert!(!anon.has_token());
    }

    #[tokio::test]
    async fn progress_unwraps_envelope_and_sends_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/user/progress")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "data": {"totalAssessments": 3}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5))
            .unwrap()
            .with_token("tok");
        let progress = client.user_progress().await.unwrap();
        assert_eq!(progress["totalAssessments"], 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn progress_401_is_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/user/progress")
            .with_status(401)
            .with_body(r#"{"success": false, "message": "Token expired"}"#)
            .create_async()
            .await;

        let client =
            ApiClient::new(&format!("{}/api", server.url()), Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.user_progress().await.unwrap_err(),
            GatewayError::Unauthorized
        );
    }
}
