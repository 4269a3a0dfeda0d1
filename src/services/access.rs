// SPDX-License-Identifier: MIT

//! Administrative access gate.
//!
//! A signed-in principal gets access if their email is on the static
//! allow-list, or if their profile document carries an admin role. Any
//! failure while reading the profile counts as denial, never as access.

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::models::Role;

/// Outcome of an access-gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Granted(Role),
    Denied,
}

impl AccessDecision {
    pub fn is_granted(self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }
}

/// Resolve whether a principal has administrative access.
///
/// `uid` is the platform user id when known (password sign-in); federated
/// sign-in only yields an email, in which case the profile is looked up by
/// email instead.
pub async fn resolve_admin_access(
    config: &Config,
    db: &FirestoreDb,
    uid: Option<&str>,
    email: &str,
) -> AccessDecision {
    if config.is_allow_listed(email) {
        return AccessDecision::Granted(Role::Admin);
    }

    let profile = match uid {
        Some(uid) => db.get_account(uid).await,
        None => db.find_account_by_email(email).await,
    };

    match profile {
        Ok(Some(account)) if account.role.grants_admin_access() => {
            AccessDecision::Granted(account.role)
        }
        Ok(_) => AccessDecision::Denied,
        Err(e) => {
            // Fail closed: a broken role check must never grant access.
            tracing::warn!(error = %e, email, "Profile role check failed, denying access");
            AccessDecision::Denied
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allow_listed_email_granted_without_db() {
        let config = Config::test_default();
        // Offline db errors on every read; allow-list short-circuits it.
        let db = FirestoreDb::new_mock();

        let decision = resolve_admin_access(&config, &db, Some("uid-1"), "ops@psia.test").await;
        assert_eq!(decision, AccessDecision::Granted(Role::Admin));
    }

    #[tokio::test]
    async fn test_profile_read_failure_is_denied() {
        let config = Config::test_default();
        let db = FirestoreDb::new_mock();

        let decision =
            resolve_admin_access(&config, &db, Some("uid-1"), "unknown@psia.test").await;
        assert_eq!(decision, AccessDecision::Denied);
    }

    #[tokio::test]
    async fn test_lookup_by_email_failure_is_denied() {
        let config = Config::test_default();
        let db = FirestoreDb::new_mock();

        let decision = resolve_admin_access(&config, &db, None, "unknown@psia.test").await;
        assert_eq!(decision, AccessDecision::Denied);
    }
}
