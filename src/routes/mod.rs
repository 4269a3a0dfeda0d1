// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod accounts;
pub mod analytics;
pub mod auth;
pub mod reports;

use crate::middleware::auth::{require_auth, require_super_admin, AuthAdmin};
use crate::models::Role;
use crate::AppState;
use axum::extract::Extension;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub super_admin: bool,
}

/// The principal behind the current session.
async fn me(Extension(admin): Extension<AuthAdmin>) -> Json<MeResponse> {
    Json(MeResponse {
        uid: admin.uid,
        email: admin.email,
        role: admin.role,
        super_admin: admin.super_admin,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the frontend URL and localhost (dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Admin API behind a valid session
    let api_routes = Router::new()
        .route("/me", get(me))
        .merge(accounts::routes())
        .merge(analytics::routes())
        .merge(reports::routes());

    // Super-admin view, additionally behind the step-up
    let super_admin_routes = accounts::super_admin_routes()
        .route_layer(middleware::from_fn(require_super_admin));

    let protected_routes = Router::new()
        .nest("/api", api_routes.merge(super_admin_routes))
        .merge(auth::session_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
