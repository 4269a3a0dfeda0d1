//! Usage-event model and dashboard aggregates.

use serde::{Deserialize, Serialize};

/// One widget-interaction session, stored in the `widgetUsage` collection.
///
/// These documents are written by the PSIA widget runtime, not by this
/// service; the field names are fixed by that producer. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    /// Firestore document id (populated on read, not stored as a field)
    #[serde(alias = "_firestore_id", default)]
    pub id: Option<String>,
    /// Owning account uid
    pub uid: String,
    /// Owning account email
    pub email: String,
    pub widget_id: String,
    #[serde(default)]
    pub widget_title: Option<String>,
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub started_at: chrono::DateTime<chrono::Utc>,
    #[serde(with = "firestore::serialize_as_optional_timestamp", default)]
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Session duration in seconds
    pub duration: i64,
}

impl UsageEvent {
    /// Display key for a widget: title when the producer recorded one,
    /// otherwise the raw widget id.
    pub fn widget_key(&self) -> &str {
        self.widget_title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.widget_id)
    }
}

/// Dashboard summary computed over the cached collections.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u32,
    pub total_sessions: u32,
    /// Mean session duration in seconds, 0 when there are no sessions
    pub avg_duration_secs: i64,
    /// Number of distinct widgets seen in the usage events
    pub active_widgets: u32,
}
