// SPDX-License-Identifier: MIT

//! PSIA Admin API Server
//!
//! Administrative backend for the PSIA platform: staff authentication,
//! account provisioning against Firebase Auth, usage analytics over
//! Firestore, and CSV report export.

use psia_admin::{
    config::Config,
    db::FirestoreDb,
    services::{DataCache, GoogleOidcVerifier, IdentityClient},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting PSIA Admin API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Identity Toolkit client with admin credentials for credential deletion
    let identity = IdentityClient::new_with_admin(
        config.firebase_api_key.clone(),
        config.gcp_project_id.clone(),
    )
    .await
    .expect("Failed to initialize identity client");

    let oidc_verifier = Arc::new(
        GoogleOidcVerifier::new(&config.google_oauth_client_id)
            .expect("Failed to initialize OIDC verifier"),
    );

    // Warm the cache and open the usage-event subscription
    let cache = DataCache::new();
    cache
        .reload(&db)
        .await
        .expect("Failed to load initial data");
    tracing::info!(
        accounts = cache.accounts().await.len(),
        "Initial data loaded"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity,
        oidc_verifier,
        cache,
    });

    // Build router
    let app = psia_admin::routes::create_router(state.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Release the usage-event subscription before exiting
    state.cache.shutdown().await;
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM (Cloud Run sends SIGTERM before stopping).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("psia_admin=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
