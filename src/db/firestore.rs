// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Accounts (profile documents in `users`)
//! - Usage events (read-only `widgetUsage` collection)
//! - The live-listen target used by the usage-event cache

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Account, UsageEvent};
use firestore::{
    FirestoreListener, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreQueryDirection,
};
use futures_util::TryStreamExt;

/// Listen target id for the usage-event subscription. The cache holds at most
/// one listener, so a single well-known target id is enough.
pub const USAGE_EVENTS_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(1_u32);

/// Live listener over the usage-event collection.
///
/// Memory-backed resume state: every fresh subscription replays the current
/// result set, which is exactly what the cache wants after a reload.
pub type UsageListener = FirestoreListener<firestore::FirestoreDb, FirestoreMemListenStateStorage>;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Account Operations ──────────────────────────────────────

    /// Get an account profile by uid.
    pub async fn get_account(&self, uid: &str) -> Result<Option<Account>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an account by email. Emails are unique per credential, so the
    /// first match wins.
    pub async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let email = email.to_string();
        let matches: Vec<Account> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("email").eq(email.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(matches.into_iter().next())
    }

    /// List all account profiles, newest first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("createdAt", FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite an account profile. Last write wins; there is no
    /// optimistic-concurrency check on these documents.
    pub async fn upsert_account(&self, account: &Account) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&account.uid)
            .object(account)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an account profile document.
    pub async fn delete_account_doc(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Usage Event Operations ──────────────────────────────────

    /// One-shot fetch of all usage events, newest first.
    ///
    /// Streamed rather than buffered by the server since this collection
    /// grows without bound.
    pub async fn list_usage_events(&self) -> Result<Vec<UsageEvent>, AppError> {
        let stream = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WIDGET_USAGE)
            .order_by([("startedAt", FirestoreQueryDirection::Descending)])
            .obj::<UsageEvent>()
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        stream
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Live Listen Plumbing ────────────────────────────────────

    /// Create a listener handle for the usage-event subscription.
    pub async fn create_usage_listener(&self) -> Result<UsageListener, AppError> {
        self.get_client()?
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))
    }

    /// Attach the usage-event query to a listener as its single target.
    pub fn attach_usage_target(&self, listener: &mut UsageListener) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WIDGET_USAGE)
            .listen()
            .add_target(USAGE_EVENTS_TARGET, listener)
            .map_err(|e| AppError::Database(format!("Failed to attach listen target: {}", e)))
    }
}
