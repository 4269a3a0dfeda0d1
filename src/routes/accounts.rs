// SPDX-License-Identifier: MIT

//! End-user account management routes.
//!
//! Listing is served from the in-memory cache; every mutation goes through
//! [`AccountService`] and re-fetches the account list afterwards so the
//! cache never serves a stale mutation result to the admin who made it.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthAdmin;
use crate::models::{Account, CreateAccountRequest, Role};
use crate::services::AccountService;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{uid}", axum::routing::delete(delete_account))
        .route("/accounts/{uid}/duration", put(update_duration))
}

/// Routes mounted behind the super-admin step-up.
pub fn super_admin_routes() -> Router<Arc<AppState>> {
    Router::new().route("/admins", get(list_admins).post(create_admin))
}

fn account_service(state: &AppState) -> AccountService {
    AccountService::new(state.db.clone(), state.identity.clone())
}

#[derive(Deserialize)]
pub struct ListParams {
    #[serde(default)]
    search: Option<String>,
}

fn apply_search(accounts: &mut Vec<Account>, search: Option<String>) {
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        let needle = search.trim().to_lowercase();
        accounts.retain(|a| {
            a.name.to_lowercase().contains(&needle) || a.email.to_lowercase().contains(&needle)
        });
    }
}

/// List regular (non-admin) accounts, optionally filtered by a name/email
/// substring. Admin accounts only show up in the super-admin view.
async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Account>> {
    let mut accounts = state.cache.accounts().await;
    accounts.retain(|a| !a.role.grants_admin_access());
    apply_search(&mut accounts, params.search);
    Json(accounts)
}

/// Provision a new end-user account. The role is always `user` here; admin
/// accounts can only be issued from the super-admin view.
async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = account_service(&state)
        .create_account(&req, Role::User, &admin.email, false)
        .await?;

    state.cache.reload_accounts(&state.db).await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Delete an account and its credential.
///
/// Admin-role targets are only deletable from an elevated session.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    Path(uid): Path<String>,
) -> Result<StatusCode> {
    let target = state
        .db
        .get_account(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", uid)))?;

    if target.role.grants_admin_access() && !admin.super_admin {
        return Err(AppError::Forbidden(
            "deleting an admin account requires super-admin verification".to_string(),
        ));
    }

    account_service(&state).delete_account(&uid).await?;
    state.cache.reload_accounts(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDurationRequest {
    duration_months: u32,
}

/// Change an account's subscription duration.
async fn update_duration(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(req): Json<UpdateDurationRequest>,
) -> Result<Json<Account>> {
    let account = account_service(&state)
        .update_duration(&uid, req.duration_months)
        .await?;

    state.cache.reload_accounts(&state.db).await?;

    Ok(Json(account))
}

/// List accounts that hold an admin role.
async fn list_admins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Account>> {
    let mut accounts = state.cache.accounts().await;
    accounts.retain(|a| a.role.grants_admin_access());
    apply_search(&mut accounts, params.search);
    Json(accounts)
}

/// Provision a new admin account (super-admin only). Duration is fixed, the
/// request's `durationMonths` is ignored.
async fn create_admin(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthAdmin>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>)> {
    let account = account_service(&state)
        .create_account(&req, Role::Admin, &admin.email, true)
        .await?;

    state.cache.reload_accounts(&state.db).await?;

    Ok((StatusCode::CREATED, Json(account)))
}
