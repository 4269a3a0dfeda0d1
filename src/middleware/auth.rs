// SPDX-License-Identifier: MIT

//! Session JWT middleware.
//!
//! Sessions are HS256 JWTs minted at login and carried in the
//! `psia_session` cookie (or an `Authorization: Bearer` header for API
//! clients). The `sa` claim marks a session that has passed the
//! super-admin step-up; it is only ever set server-side.

use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "psia_session";

const SESSION_TTL_SECS: usize = 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (platform uid, or the federated subject for allow-list logins)
    pub sub: String,
    /// Staff email
    pub email: String,
    /// Admin role granted by the access gate
    pub role: Role,
    /// Super-admin step-up completed
    #[serde(default)]
    pub sa: bool,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Authenticated admin extracted from the session JWT.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub super_admin: bool,
}

fn token_from_request(jar: &CookieJar, request: &Request) -> Option<String> {
    // Cookie first, then header
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Decode and validate a session JWT.
pub fn decode_session_jwt(token: &str, signing_key: &[u8]) -> Result<Claims, StatusCode> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

/// Middleware that requires a valid admin session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = token_from_request(&jar, &request).ok_or(StatusCode::UNAUTHORIZED)?;
    let claims = decode_session_jwt(&token, &state.config.jwt_signing_key)?;

    let auth_admin = AuthAdmin {
        uid: claims.sub,
        email: claims.email,
        role: claims.role,
        super_admin: claims.sa,
    };
    request.extensions_mut().insert(auth_admin);

    Ok(next.run(request).await)
}

/// Middleware for routes behind the super-admin step-up.
///
/// Runs after [`require_auth`]; rejects sessions whose `sa` claim is unset.
pub async fn require_super_admin(request: Request, next: Next) -> Result<Response, StatusCode> {
    let granted = request
        .extensions()
        .get::<AuthAdmin>()
        .is_some_and(|admin| admin.super_admin);

    if !granted {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(request).await)
}

/// Create a session JWT for a signed-in admin.
pub fn create_session_jwt(
    uid: &str,
    email: &str,
    role: Role,
    super_admin: bool,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: uid.to_string(),
        email: email.to_string(),
        role,
        sa: super_admin,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
