// SPDX-License-Identifier: MIT

//! PSIA Admin API
//!
//! Administrative backend for the PSIA platform: staff authentication,
//! end-user account provisioning and deletion against Firebase Auth,
//! usage analytics over Firestore, and CSV report export.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::FirestoreDb;
use services::{cache::DataCache, GoogleOidcVerifier, IdentityClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity: IdentityClient,
    pub oidc_verifier: Arc<GoogleOidcVerifier>,
    pub cache: DataCache,
}
