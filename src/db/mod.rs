//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FirestoreDb, UsageListener};

/// Collection names as constants.
pub mod collections {
    /// Account profile documents, keyed by platform uid.
    pub const USERS: &str = "users";
    /// Widget-interaction sessions written by the PSIA widget runtime.
    pub const WIDGET_USAGE: &str = "widgetUsage";
}
