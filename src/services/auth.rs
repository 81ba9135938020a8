//! Bearer token verification against the hosted identity service
//!
//! Tokens are opaque here: they are exchanged via `GET /auth/v1/user` for the user
//! they belong to. Any failure on that path surfaces as `Unauthorized`.
use crate::{
    error::{AppError, AppResult},
    models::{AuthenticatedUser, IdentityUser},
};
use reqwest::Client as HttpClient;
use uuid::Uuid;

/// Trait for identity providers that resolve bearer tokens to users
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser>;
}

/// Extracts the token from an `Authorization` header value
///
/// A `Bearer ` prefix is stripped when present; otherwise the value is forwarded as-is
/// and left for the identity service to reject.
pub fn bearer_token(authorization: Option<&str>) -> AppResult<&str> {
    let header = authorization.ok_or(AppError::MissingAuthorization)?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(token)
}

/// Resolves the caller behind an `Authorization` header
pub async fn authenticate(
    identity: &dyn IdentityProvider,
    authorization: Option<&str>,
) -> AppResult<AuthenticatedUser> {
    let token = bearer_token(authorization)?;
    identity.verify(token).await
}

#[derive(Clone)]
pub struct SupabaseIdentity {
    http_client: HttpClient,
    auth_url: String,
    service_key: String,
}

impl SupabaseIdentity {
    pub fn new(auth_url: String, service_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            auth_url,
            service_key,
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.auth_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let response = self
            .http_client
            .get(self.user_url())
            .bearer_auth(token)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Identity service request failed");
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Token rejected by identity service");
            return Err(AppError::Unauthorized);
        }

        let user: IdentityUser = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to decode identity response");
            AppError::Unauthorized
        })?;

        let id = Uuid::parse_str(&user.id).map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Identity returned a non-UUID id");
            AppError::Unauthorized
        })?;

        Ok(AuthenticatedUser {
            id,
            email: user.email,
        })
    }
}
