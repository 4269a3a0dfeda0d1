// SPDX-License-Identifier: MIT

//! In-memory projection of the backend collections.
//!
//! Accounts are loaded with a one-shot fetch and refreshed by explicit
//! re-fetch after mutations. Usage events are kept fresh by a Firestore
//! listen target; the cache owns at most one live listener and shuts the
//! previous one down before opening a new one (and on teardown), so no
//! background listener can leak across reloads.

use crate::db::{FirestoreDb, UsageListener};
use crate::error::AppError;
use crate::models::{Account, UsageEvent};
use firestore::FirestoreListenEvent;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type UsageMap = Arc<RwLock<BTreeMap<String, UsageEvent>>>;

/// Shared read-mostly cache of accounts and usage events.
#[derive(Clone)]
pub struct DataCache {
    accounts: Arc<RwLock<Vec<Account>>>,
    usage: UsageMap,
    listener: Arc<Mutex<Option<UsageListener>>>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCache {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(Vec::new())),
            usage: Arc::new(RwLock::new(BTreeMap::new())),
            listener: Arc::new(Mutex::new(None)),
        }
    }

    /// Snapshot of cached accounts (ordered newest first, as fetched).
    pub async fn accounts(&self) -> Vec<Account> {
        self.accounts.read().await.clone()
    }

    /// Snapshot of cached usage events, newest first.
    pub async fn usage_events(&self) -> Vec<UsageEvent> {
        let mut events: Vec<UsageEvent> = self.usage.read().await.values().cloned().collect();
        events.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        events
    }

    /// Re-fetch the account collection. Called after every account mutation.
    pub async fn reload_accounts(&self, db: &FirestoreDb) -> Result<(), AppError> {
        let accounts = db.list_accounts().await?;
        tracing::debug!(count = accounts.len(), "Account cache reloaded");
        *self.accounts.write().await = accounts;
        Ok(())
    }

    /// Full reload: accounts plus a fresh usage-event subscription.
    pub async fn reload(&self, db: &FirestoreDb) -> Result<(), AppError> {
        self.reload_accounts(db).await?;
        self.resubscribe(db).await
    }

    /// (Re)open the usage-event subscription.
    ///
    /// The previous listener, if any, is shut down first; then the current
    /// result set is fetched one-shot and the listen target takes over.
    pub async fn resubscribe(&self, db: &FirestoreDb) -> Result<(), AppError> {
        let mut guard = self.listener.lock().await;

        if let Some(mut old) = guard.take() {
            if let Err(e) = old.shutdown().await {
                tracing::warn!(error = %e, "Previous usage listener shutdown failed");
            }
        }

        let events = db.list_usage_events().await?;
        {
            let mut map = self.usage.write().await;
            map.clear();
            for event in events {
                let key = event
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}-{}", event.uid, event.started_at.timestamp()));
                map.insert(key, event);
            }
        }

        let mut listener = db.create_usage_listener().await?;
        db.attach_usage_target(&mut listener)?;

        let usage = self.usage.clone();
        listener
            .start(move |event| {
                let usage = usage.clone();
                async move {
                    apply_listen_event(&usage, event).await;
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start usage listener: {}", e)))?;

        tracing::info!("Usage-event subscription opened");
        *guard = Some(listener);
        Ok(())
    }

    /// Release the live subscription (server teardown).
    pub async fn shutdown(&self) {
        let mut guard = self.listener.lock().await;
        if let Some(mut listener) = guard.take() {
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, "Usage listener shutdown failed");
            }
        }
    }
}

/// Apply one listen event to the usage map.
///
/// Malformed documents are skipped with a warning rather than propagated:
/// one bad producer write must not take the whole subscription down.
async fn apply_listen_event(usage: &UsageMap, event: FirestoreListenEvent) {
    match event {
        FirestoreListenEvent::DocumentChange(ref change) => {
            if let Some(doc) = &change.document {
                let doc_id = doc_id_from_path(&doc.name).to_string();
                match firestore::FirestoreDb::deserialize_doc_to::<UsageEvent>(doc) {
                    Ok(mut parsed) => {
                        if parsed.id.is_none() {
                            parsed.id = Some(doc_id.clone());
                        }
                        usage.write().await.insert(doc_id, parsed);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, doc = %doc_id, "Skipping malformed usage event");
                    }
                }
            }
        }
        FirestoreListenEvent::DocumentDelete(ref delete) => {
            let doc_id = doc_id_from_path(&delete.document).to_string();
            usage.write().await.remove(&doc_id);
        }
        _ => {}
    }
}

/// Last path segment of a Firestore document name.
fn doc_id_from_path(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, secs: i64) -> UsageEvent {
        UsageEvent {
            id: Some(id.to_string()),
            uid: "uid-1".to_string(),
            email: "user@psia.test".to_string(),
            widget_id: "w1".to_string(),
            widget_title: None,
            started_at: Utc.timestamp_opt(secs, 0).unwrap(),
            ended_at: None,
            duration: 60,
        }
    }

    #[test]
    fn test_doc_id_from_path() {
        assert_eq!(
            doc_id_from_path("projects/p/databases/(default)/documents/widgetUsage/abc123"),
            "abc123"
        );
        assert_eq!(doc_id_from_path("bare-id"), "bare-id");
    }

    #[tokio::test]
    async fn test_usage_events_sorted_newest_first() {
        let cache = DataCache::new();
        {
            let mut map = cache.usage.write().await;
            map.insert("a".to_string(), event("a", 100));
            map.insert("b".to_string(), event("b", 300));
            map.insert("c".to_string(), event("c", 200));
        }

        let events = cache.usage_events().await;
        let ids: Vec<&str> = events.iter().filter_map(|e| e.id.as_deref()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_shutdown_is_safe_without_listener() {
        // Teardown can race a never-opened or already-failed subscription.
        let cache = DataCache::new();
        cache.shutdown().await;
        cache.shutdown().await;
        assert!(cache.listener.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_resubscribe_offline_fails_without_poisoning() {
        let cache = DataCache::new();
        let db = FirestoreDb::new_mock();

        assert!(cache.resubscribe(&db).await.is_err());
        // No listener handle may be left behind after a failed subscribe.
        assert!(cache.listener.lock().await.is_none());
    }
}
