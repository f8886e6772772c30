//! Identity provider client (GoTrue REST API)
//!
//! Credentials never touch this service: sign-in, sign-up and admin user
//! creation are forwarded to the provider, which issues the session JWT.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{upstream_message, IntegrationError};

const SERVICE: &str = "identity provider";

/// User as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

/// Session returned by a password grant or an auto-confirmed sign-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: ProviderUser,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Outcome of a sign-up; `session` is `None` when email confirmation is pending
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: ProviderUser,
    pub session: Option<AuthSession>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminCreateUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email and password for a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IntegrationError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IntegrationError>;

    /// Revoke the session behind `access_token`
    async fn sign_out(&self, access_token: &str) -> Result<(), IntegrationError>;

    /// Create a confirmed user with the service key
    async fn admin_create_user(
        &self,
        request: &AdminCreateUser,
    ) -> Result<ProviderUser, IntegrationError>;

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), IntegrationError>;
}

/// GoTrue client
///
/// `base_url` is the auth API root, e.g. `https://<project>.supabase.co/auth/v1`.
pub struct GoTrueClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, service_key)
    }

    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_from(response: reqwest::Response) -> IntegrationError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = upstream_message(&body);

        match status {
            StatusCode::UNPROCESSABLE_ENTITY if message.contains("already") => {
                IntegrationError::AlreadyExists
            }
            _ => IntegrationError::Upstream {
                service: SERVICE,
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IntegrationError> {
        debug!("Password grant for {}", email);

        let response = self
            .http
            .post(self.url("/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.service_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(response.json::<AuthSession>().await?),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(IntegrationError::InvalidCredentials)
            }
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, IntegrationError> {
        let response = self
            .http
            .post(self.url("/signup"))
            .header("apikey", &self.service_key)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "data": {
                    "full_name": request.full_name,
                    "phone": request.phone,
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let body: serde_json::Value = response.json().await?;
        let outcome = parse_sign_up(body)?;
        info!("Signed up user {}", outcome.user.id);
        Ok(outcome)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IntegrationError> {
        let response = self
            .http
            .post(self.url("/logout"))
            .header("apikey", &self.service_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        // An already revoked session is a successful sign-out
        if response.status().is_success() || response.status() == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }

    async fn admin_create_user(
        &self,
        request: &AdminCreateUser,
    ) -> Result<ProviderUser, IntegrationError> {
        let response = self
            .http
            .post(self.url("/admin/users"))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "email": request.email,
                "password": request.password,
                "email_confirm": true,
                "user_metadata": { "full_name": request.full_name },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let user: ProviderUser = response.json().await?;
        info!("Provider user {} created by admin", user.id);
        Ok(user)
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<(), IntegrationError> {
        let response = self
            .http
            .delete(self.url(&format!("/admin/users/{}", user_id)))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                warn!("Provider user {} was already gone", user_id);
                Ok(())
            }
            _ => Err(Self::error_from(response).await),
        }
    }
}

/// Sign-up responds with a session when auto-confirm is on, otherwise the bare user
fn parse_sign_up(body: serde_json::Value) -> Result<SignUpOutcome, IntegrationError> {
    if body.get("access_token").is_some() {
        let session: AuthSession = serde_json::from_value(body)
            .map_err(|e| IntegrationError::invalid_response(SERVICE, e.to_string()))?;
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = body.get("user").cloned().unwrap_or(body);
    let user: ProviderUser = serde_json::from_value(user_value)
        .map_err(|e| IntegrationError::invalid_response(SERVICE, e.to_string()))?;

    Ok(SignUpOutcome {
        user,
        session: None,
    })
}
