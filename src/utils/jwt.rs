// src/utils/jwt.rs

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Role carried by every subject token. Tokens with any other role are refused.
pub const SUBJECT_ROLE: &str = "user";

/// Claims of a subject token.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    pub role: String,
    pub iat: i64,
    /// Expiry as a Unix timestamp.
    pub exp: i64,
}

impl Claims {
    fn for_subject(user_id: i64, ttl_secs: u64) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            role: SUBJECT_ROLE.to_string(),
            iat,
            exp: iat.saturating_add(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// The authenticated user's id.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Issues an HS256 subject token valid for `ttl_secs`.
pub fn sign_jwt(user_id: i64, secret: &str, ttl_secs: u64) -> Result<String, AppError> {
    encode(
        &Header::default(),
        &Claims::for_subject(user_id, ttl_secs),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Decodes a subject token, checking signature, expiry and role.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?
    .claims;

    if claims.role != SUBJECT_ROLE {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }
    Ok(claims)
}

/// Bearer authentication for the protected routes.
///
/// Injects the verified `Claims` into the request extensions; anything else
/// is answered with a 401 JSON error.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?;

    let claims = verify_jwt(token, &config.jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
