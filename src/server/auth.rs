//! Bearer-token authorization for the on-demand trigger

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::HttpError;
use crate::config::AuthConfig;

/// JWT claims carried by operator tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 tokens signed with the shared secret.
#[derive(Clone)]
pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    admin_role: String,
    ttl: Duration,
}

impl JwtAuthority {
    pub fn new(config: &AuthConfig) -> Self {
        JwtAuthority {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            admin_role: config.admin_role.clone(),
            ttl: Duration::days(config.token_ttl_days),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    pub fn issue(&self, subject: &str, role: &str) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(subject, role, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        subject: &str,
        role: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Checks signature and expiry; says nothing about the role.
    pub fn verify(&self, token: &str) -> Result<Claims, HttpError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| HttpError::Unauthorized(format!("Invalid token: {}", e)))
    }

    /// Verifies the token and requires the administrative role.
    pub fn authorize_admin(&self, token: &str) -> Result<Claims, HttpError> {
        let claims = self.verify(token)?;
        if claims.role != self.admin_role {
            return Err(HttpError::Forbidden(format!(
                "Role '{}' is not allowed to trigger backups",
                claims.role
            )));
        }
        Ok(claims)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects the request before the handler runs unless it carries an admin token.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        HttpError::Unauthorized("Missing or malformed Authorization bearer token".to_string())
    })?;
    let claims = state.auth.authorize_admin(token)?;
    tracing::debug!(subject = %claims.sub, "Authorized admin request");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn authority() -> JwtAuthority {
        JwtAuthority::new(&AuthConfig {
            jwt_secret: "test-secret".into(),
            admin_role: "portfolio_admin".into(),
            token_ttl_days: 7,
        })
    }

    #[test]
    fn test_issue_then_verify() -> anyhow::Result<()> {
        let auth = authority();
        let token = auth.issue("alice", "portfolio_admin")?;
        let claims = auth.verify(&token)?;
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, "portfolio_admin");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        Ok(())
    }

    #[test]
    fn test_expired_token_rejected() -> anyhow::Result<()> {
        let auth = authority();
        let token = auth.issue_at("alice", "portfolio_admin", Utc::now() - Duration::days(8))?;
        assert!(matches!(auth.verify(&token), Err(HttpError::Unauthorized(_))));
        Ok(())
    }

    #[test]
    fn test_foreign_signature_rejected() -> anyhow::Result<()> {
        let other = JwtAuthority::new(&AuthConfig {
            jwt_secret: "another-secret".into(),
            admin_role: "portfolio_admin".into(),
            token_ttl_days: 7,
        });
        let token = other.issue("mallory", "portfolio_admin")?;
        assert!(matches!(authority().verify(&token), Err(HttpError::Unauthorized(_))));
        Ok(())
    }

    #[test]
    fn test_wrong_role_forbidden() -> anyhow::Result<()> {
        let auth = authority();
        let token = auth.issue("bob", "viewer")?;
        assert!(matches!(auth.authorize_admin(&token), Err(HttpError::Forbidden(_))));
        Ok(())
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }
}
