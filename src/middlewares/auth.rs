use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::handlers::ApiError;
use crate::models::user::UpsertUser;
use crate::services::AppState;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub sub: String, // user_id
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    pub exp: usize, // expiration timestamp
    pub iat: usize, // issued at timestamp
}

impl JwtClaims {
    pub fn to_upsert_user(&self) -> UpsertUser {
        UpsertUser {
            id: self.sub.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            profile_image_url: self.profile_image_url.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// Caller identity attached to every /api request. The explicit `Anonymous`
/// arm replaces any magic default-user id, so real user ids can never
/// collide with the anonymous session.
#[derive(Debug, Clone)]
pub enum Identity {
    Authenticated(JwtClaims),
    Anonymous,
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Authenticated(claims) => Some(&claims.sub),
            Identity::Anonymous => None,
        }
    }

    pub fn claims(&self) -> Option<&JwtClaims> {
        match self {
            Identity::Authenticated(claims) => Some(claims),
            Identity::Anonymous => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Identity::Authenticated(claims) if claims.is_admin)
    }
}

#[derive(Debug)]
pub enum AuthError {
    InvalidToken,
    ExpiredToken,
    InvalidSignature,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token expired"),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
        }
    }
}

impl std::error::Error for AuthError {}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AuthError::InvalidToken)
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::default();

        decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                if e.to_string().contains("ExpiredSignature") {
                    AuthError::ExpiredToken
                } else if e.to_string().contains("InvalidSignature") {
                    AuthError::InvalidSignature
                } else {
                    AuthError::InvalidToken
                }
            })
    }
}

/// Resolves the caller identity for every /api request. A valid bearer token
/// yields `Identity::Authenticated`; anything else (no token, bad token)
/// degrades to `Identity::Anonymous` rather than rejecting the request.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let mut identity = Identity::Anonymous;

    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        let jwt_service = JwtService::new(&state.config.jwt_secret);
        match jwt_service.validate_token(token) {
            Ok(claims) => {
                tracing::debug!("Authenticated user: {}", claims.sub);
                identity = Identity::Authenticated(claims);
            }
            Err(e) => {
                tracing::warn!("JWT validation failed, treating as anonymous: {}", e);
            }
        }
    }

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Guards /api/admin routes. Requires an authenticated identity with the
/// admin flag: anonymous callers get 401, non-admins 403.
pub async fn admin_guard_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<Identity>() {
        Some(Identity::Authenticated(claims)) if claims.is_admin => Ok(next.run(request).await),
        Some(Identity::Authenticated(claims)) => {
            tracing::warn!("Access denied for {}: admin flag required", claims.sub);
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
        _ => Err(ApiError::Unauthorized(
            "Authentication required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(is_admin: bool) -> JwtClaims {
        JwtClaims {
            sub: "user123".to_string(),
            email: Some("user@example.com".to_string()),
            first_name: Some("Pat".to_string()),
            last_name: None,
            profile_image_url: None,
            is_admin,
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            iat: chrono::Utc::now().timestamp() as usize,
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = JwtService::new("test-secret");

        let token = service.generate_token(claims(false)).unwrap();
        let validated = service.validate_token(&token).unwrap();

        assert_eq!(validated.sub, "user123");
        assert_eq!(validated.email.as_deref(), Some("user@example.com"));
        assert!(!validated.is_admin);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let service = JwtService::new("test-secret");
        let token = service.generate_token(claims(false)).unwrap();

        let other = JwtService::new("other-secret");
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn identity_exposes_admin_flag() {
        let admin = Identity::Authenticated(claims(true));
        let user = Identity::Authenticated(claims(false));

        assert!(admin.is_admin());
        assert!(!user.is_admin());
        assert!(!Identity::Anonymous.is_admin());
        assert_eq!(Identity::Anonymous.user_id(), None);
        assert_eq!(user.user_id(), Some("user123"));
    }
}
