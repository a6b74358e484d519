//! Bearer-token authentication for the history and migration routes.
//!
//! Tokens are issued by the managed auth provider and signed HS256 with a
//! secret shared through configuration. `sub` is the user id.

use crate::config::AuthConfig;
use crate::startup::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &config.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AppError> {
        let data = decode::<AccessTokenClaims>(token, &self.key, &self.validation)?;
        if data.claims.sub.trim().is_empty() {
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Token has no subject"
            )));
        }
        Ok(data.claims)
    }
}

/// The authenticated caller. Rejects with 401 when the header is missing or
/// the token does not verify.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AccessTokenClaims);

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.0.sub
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header"))
            })?;

        let claims = state.auth.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            e
        })?;

        Ok(AuthUser(claims))
    }
}
