// SPDX-License-Identifier: MIT

use psia_admin::config::Config;
use psia_admin::db::FirestoreDb;
use psia_admin::routes::create_router;
use psia_admin::services::{DataCache, GoogleOidcVerifier, IdentityClient};
use psia_admin::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}

/// Create a test app over a given database connection.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let oidc_verifier = Arc::new(
        GoogleOidcVerifier::new(&config.google_oauth_client_id)
            .expect("Failed to build OIDC verifier"),
    );
    build_test_app(db, oidc_verifier)
}

/// Create a test app with a static-key OIDC verifier, so tests can mint
/// valid Google-style ID tokens locally.
#[allow(dead_code)]
pub fn create_test_app_with_verifier(
    oidc_verifier: Arc<GoogleOidcVerifier>,
) -> (axum::Router, Arc<AppState>) {
    build_test_app(test_db_offline(), oidc_verifier)
}

fn build_test_app(
    db: FirestoreDb,
    oidc_verifier: Arc<GoogleOidcVerifier>,
) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();

    // Unroutable identity base URL: any request that reaches the network
    // is a test bug.
    let identity = IdentityClient::new_mock("http://127.0.0.1:1".to_string());

    let state = Arc::new(AppState {
        config,
        db,
        identity,
        oidc_verifier,
        cache: DataCache::new(),
    });

    (create_router(state.clone()), state)
}
