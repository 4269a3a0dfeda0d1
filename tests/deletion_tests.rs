// SPDX-License-Identifier: MIT

//! Account deletion tests.
//!
//! Deletion removes the profile document even when the credential cannot
//! be deleted; a credential-provider failure is never the reason an
//! account lingers in the console.

use psia_admin::models::{Account, Role};
use psia_admin::services::{AccountService, IdentityClient};
use psia_admin::time_utils::{expiry_from_today, today_str};

mod common;

fn account(uid: &str, email: &str) -> Account {
    Account {
        uid: uid.to_string(),
        name: "Test User".to_string(),
        email: email.to_string(),
        duration_months: 3,
        start_date: today_str(),
        expiry_date: expiry_from_today(3),
        role: Role::User,
        created_at: chrono::Utc::now(),
        created_by: "ops@psia.test".to_string(),
    }
}

#[tokio::test]
async fn test_delete_removes_profile_despite_credential_failure() {
    require_emulator!();

    let db = common::test_db().await;
    let uid = format!("del-{}", chrono::Utc::now().timestamp_micros());
    db.upsert_account(&account(&uid, "delete-me@psia.test"))
        .await
        .unwrap();

    // No admin credentials configured: the credential deletion fails, the
    // profile removal must still happen.
    let service = AccountService::new(db.clone(), IdentityClient::new_mock(
        "http://127.0.0.1:1".to_string(),
    ));

    service.delete_account(&uid).await.unwrap();

    assert!(db.get_account(&uid).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_unknown_account_is_not_found() {
    require_emulator!();

    let db = common::test_db().await;
    let service = AccountService::new(
        db,
        IdentityClient::new_mock("http://127.0.0.1:1".to_string()),
    );

    let err = service.delete_account("no-such-uid").await.unwrap_err();
    assert!(matches!(err, psia_admin::error::AppError::NotFound(_)));
}
