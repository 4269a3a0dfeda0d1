// SPDX-License-Identifier: MIT

//! Staff authentication routes.
//!
//! Two sign-in paths produce the same session JWT: email/password against
//! the identity provider, and a Google ID token from the frontend sign-in
//! popup. Both run the same access gate before a session is minted.
//!
//! The super-admin step-up never replaces the primary session on failure:
//! a wrong credential returns 403 and the existing cookie is untouched.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_jwt, AuthAdmin, SESSION_COOKIE};
use crate::models::Role;
use crate::services::access::{resolve_admin_access, AccessDecision};
use crate::services::oidc::OidcError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/google", post(google_login))
        .route("/auth/logout", post(logout))
}

/// Routes that require an existing session (mounted behind `require_auth`).
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/superadmin/verify", post(superadmin_verify))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginRequest {
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    token: String,
    email: String,
    role: Role,
    super_admin: bool,
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn session_response(
    jar: CookieJar,
    uid: &str,
    email: &str,
    role: Role,
    super_admin: bool,
    signing_key: &[u8],
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_session_jwt(uid, email, role, super_admin, signing_key)
        .map_err(AppError::Internal)?;

    let response = SessionResponse {
        token: token.clone(),
        email: email.to_string(),
        role,
        super_admin,
    };

    Ok((jar.add(session_cookie(&token)), Json(response)))
}

/// Email/password staff login.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let signed_in = state
        .identity
        .sign_in_with_password(&req.email, &req.password)
        .await?;

    let decision = resolve_admin_access(
        &state.config,
        &state.db,
        Some(&signed_in.local_id),
        &signed_in.email,
    )
    .await;

    let role = match decision {
        AccessDecision::Granted(role) => role,
        AccessDecision::Denied => {
            tracing::warn!(email = %signed_in.email, "Sign-in without admin access");
            return Err(AppError::Forbidden("not an administrator".to_string()));
        }
    };

    tracing::info!(email = %signed_in.email, role = role.as_str(), "Staff login");

    session_response(
        jar,
        &signed_in.local_id,
        &signed_in.email,
        role,
        false,
        &state.config.jwt_signing_key,
    )
}

/// Google federated staff login.
async fn google_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state
        .oidc_verifier
        .verify_id_token(&req.id_token)
        .await
        .map_err(|e| match e {
            OidcError::Denied(msg) => {
                tracing::warn!(reason = %msg, "Google ID token rejected");
                AppError::InvalidToken
            }
            OidcError::Transient(msg) => {
                AppError::IdentityApi(format!("OIDC verification unavailable: {}", msg))
            }
        })?;

    let decision = resolve_admin_access(&state.config, &state.db, None, &identity.email).await;

    let role = match decision {
        AccessDecision::Granted(role) => role,
        AccessDecision::Denied => {
            tracing::warn!(email = %identity.email, "Federated sign-in without admin access");
            return Err(AppError::Forbidden("not an administrator".to_string()));
        }
    };

    tracing::info!(email = %identity.email, role = role.as_str(), "Staff login via Google");

    session_response(
        jar,
        &identity.subject,
        &identity.email,
        role,
        false,
        &state.config.jwt_signing_key,
    )
}

/// Super-admin step-up: re-verify a fresh Google ID token and mint an
/// elevated session.
///
/// The verified email must match the configured super-admin address; any
/// mismatch or invalid token is a 403, and because the cookie is only
/// written on success, the caller's primary session survives the failure.
async fn superadmin_verify(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    jar: CookieJar,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let identity = state
        .oidc_verifier
        .verify_id_token(&req.id_token)
        .await
        .map_err(|e| match e {
            OidcError::Denied(msg) => {
                tracing::warn!(reason = %msg, by = %admin.email, "Super-admin step-up token rejected");
                AppError::Forbidden("super-admin verification failed".to_string())
            }
            OidcError::Transient(msg) => {
                AppError::IdentityApi(format!("OIDC verification unavailable: {}", msg))
            }
        })?;

    if !identity
        .email
        .eq_ignore_ascii_case(&state.config.super_admin_email)
    {
        tracing::warn!(
            verified = %identity.email,
            by = %admin.email,
            "Super-admin step-up with wrong identity"
        );
        return Err(AppError::Forbidden(
            "super-admin verification failed".to_string(),
        ));
    }

    tracing::info!(by = %admin.email, "Super-admin step-up granted");

    session_response(
        jar,
        &identity.subject,
        &identity.email,
        Role::Superadmin,
        true,
        &state.config.jwt_signing_key,
    )
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build()),
        StatusCode::NO_CONTENT,
    )
}
