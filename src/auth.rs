//! Bearer-token authorization.
//!
//! Tokens are issued by the external identity provider and signed with a
//! shared HS256 secret. This module only verifies them and decides who may
//! see what; there is no login flow here.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, warn};
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::Settings;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Access denied")]
    Forbidden,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
}

pub struct AuthConfig {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
    admin_email: Option<String>,
}

impl AuthConfig {
    pub fn new(secret: &str, admin_email: Option<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;

        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation,
            admin_email: admin_email.map(|e| e.to_lowercase()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.jwt_secret, settings.admin_email.clone())
    }

    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            debug!("Rejected token: {}", e);
            AuthError::InvalidToken(e.to_string())
        })?;

        Ok(self.user_from_claims(data.claims))
    }

    fn user_from_claims(&self, claims: Claims) -> AuthUser {
        let role_admin = claims.role.as_deref() == Some(ADMIN_ROLE);
        let email_admin = match (&self.admin_email, &claims.email) {
            (Some(admin), Some(email)) => admin == &email.to_lowercase(),
            _ => false,
        };

        AuthUser {
            user_id: claims.sub,
            email: claims.email,
            is_admin: role_admin || email_admin,
        }
    }

    /// Sign a token with the shared secret. Used by tooling and tests.
    pub fn issue(
        &self,
        sub: &str,
        email: Option<&str>,
        role: Option<&str>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: sub.to_string(),
            email: email.map(str::to_string),
            role: role.map(str::to_string),
            exp: (Utc::now() + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl AuthUser {
    /// Owners see their own records; admins see everything.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin || self.user_id == owner_id
    }

    pub fn ensure_access(&self, owner_id: &str) -> Result<(), AuthError> {
        if self.can_access(owner_id) {
            Ok(())
        } else {
            warn!("🚫 User {} denied access to records of {}", self.user_id, owner_id);
            Err(AuthError::Forbidden)
        }
    }
}

pub fn require_admin(user: &AuthUser) -> Result<(), AuthError> {
    if user.is_admin {
        Ok(())
    } else {
        warn!("🚫 Non-admin user {} requested concealed data", user.user_id);
        Err(AuthError::Forbidden)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<AuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::MissingToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .or_else(|| header_value.strip_prefix("bearer "))
            .ok_or(AuthError::MissingToken)?
            .trim();

        let config = Arc::<AuthConfig>::from_ref(state);
        config.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret", Some("Boss@Example.com".to_string()))
    }

    #[test]
    fn issued_tokens_verify() {
        let cfg = config();
        let token = cfg.issue("user-1", Some("u1@example.com"), None, Duration::hours(1)).unwrap();
        let user = cfg.verify(&token).unwrap();
        assert_eq!(user.user_id, "user-1");
        assert!(!user.is_admin);
    }

    #[test]
    fn admin_by_role_or_configured_email() {
        let cfg = config();
        let by_role = cfg.issue("a", None, Some("admin"), Duration::hours(1)).unwrap();
        assert!(cfg.verify(&by_role).unwrap().is_admin);

        let by_email = cfg.issue("b", Some("boss@example.com"), None, Duration::hours(1)).unwrap();
        assert!(cfg.verify(&by_email).unwrap().is_admin);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_fail() {
        let cfg = config();
        let other = AuthConfig::new("other-secret", None);
        let token = other.issue("x", None, None, Duration::hours(1)).unwrap();
        assert!(matches!(cfg.verify(&token), Err(AuthError::InvalidToken(_))));

        let expired = cfg.issue("x", None, None, Duration::hours(-2)).unwrap();
        assert!(matches!(cfg.verify(&expired), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn access_rules() {
        let user = AuthUser { user_id: "u1".into(), email: None, is_admin: false };
        assert!(user.can_access("u1"));
        assert_eq!(user.ensure_access("u2"), Err(AuthError::Forbidden));
        assert_eq!(require_admin(&user), Err(AuthError::Forbidden));

        let admin = AuthUser { is_admin: true, ..user };
        assert!(admin.can_access("u2"));
        assert!(require_admin(&admin).is_ok());
    }
}
