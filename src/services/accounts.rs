// SPDX-License-Identifier: MIT

//! Account provisioning, deletion, and duration edits.
//!
//! Provisioning creates the credential first and the profile document
//! second; if the profile write fails the credential is rolled back so no
//! orphaned login can exist. There is no idempotency key: retrying a
//! partially failed provisioning can still collide on a duplicate email.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Account, CreateAccountRequest, Role};
use crate::services::identity::IdentityClient;
use crate::time_utils::{expiry_from_today, today_str};
use validator::Validate;

/// Accounts issued from the super-admin view do not pick a duration; they
/// get a fixed long subscription.
pub const SUPER_ADMIN_ISSUED_DURATION_MONTHS: u32 = 120;

/// Account lifecycle workflows.
#[derive(Clone)]
pub struct AccountService {
    db: FirestoreDb,
    identity: IdentityClient,
}

impl AccountService {
    pub fn new(db: FirestoreDb, identity: IdentityClient) -> Self {
        Self { db, identity }
    }

    /// Provision a new account: create the credential, then write the
    /// profile document.
    ///
    /// Failure handling: a duplicate-email rejection from the provider is
    /// reported as [`AppError::DuplicateEmail`] before any credential
    /// exists, so nothing is rolled back. If the profile write fails after
    /// the credential was created, the credential is deleted again
    /// (best-effort) using its own ID token.
    pub async fn create_account(
        &self,
        req: &CreateAccountRequest,
        role: Role,
        created_by: &str,
        superadmin_issued: bool,
    ) -> Result<Account, AppError> {
        req.validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let duration_months = if superadmin_issued {
            SUPER_ADMIN_ISSUED_DURATION_MONTHS
        } else {
            req.duration_months
        };

        let credential = self.identity.sign_up(&req.email, &req.password).await?;

        let account = Account {
            uid: credential.local_id.clone(),
            name: req.name.clone(),
            email: req.email.clone(),
            duration_months,
            start_date: today_str(),
            expiry_date: expiry_from_today(duration_months),
            role,
            created_at: chrono::Utc::now(),
            created_by: created_by.to_string(),
        };

        if let Err(db_err) = self.db.upsert_account(&account).await {
            tracing::error!(
                error = %db_err,
                email = %req.email,
                "Profile write failed after credential creation, rolling back credential"
            );

            if let Err(rollback_err) = self
                .identity
                .delete_with_token(&credential.id_token)
                .await
            {
                // Swallow: the original failure is what the caller needs to see.
                tracing::warn!(
                    error = %rollback_err,
                    uid = %credential.local_id,
                    "Credential rollback failed, orphaned credential remains"
                );
            }

            return Err(db_err);
        }

        tracing::info!(
            uid = %account.uid,
            role = account.role.as_str(),
            created_by,
            "Account provisioned"
        );

        Ok(account)
    }

    /// Delete an account: best-effort credential removal, then the profile
    /// document unconditionally.
    pub async fn delete_account(&self, uid: &str) -> Result<(), AppError> {
        let account = self
            .db
            .get_account(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", uid)))?;

        if let Err(e) = self.identity.admin_delete(uid).await {
            // Non-fatal: the profile must go away even if the credential
            // cannot be removed right now.
            tracing::warn!(
                error = %e,
                uid,
                email = %account.email,
                "Credential deletion failed, removing profile anyway"
            );
        }

        self.db.delete_account_doc(uid).await?;

        tracing::info!(uid, email = %account.email, "Account deleted");
        Ok(())
    }

    /// Change an account's subscription duration.
    ///
    /// Expiry is recomputed from today, not from the original start date, so
    /// repeated edits drift the effective total length. Known product
    /// behavior, kept until product says otherwise.
    pub async fn update_duration(&self, uid: &str, months: u32) -> Result<Account, AppError> {
        if !(1..=120).contains(&months) {
            return Err(AppError::BadRequest(
                "duration must be 1-120 months".to_string(),
            ));
        }

        let mut account = self
            .db
            .get_account(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {} not found", uid)))?;

        account.duration_months = months;
        account.expiry_date = expiry_from_today(months);

        self.db.upsert_account(&account).await?;

        tracing::info!(uid, months, expiry = %account.expiry_date, "Duration updated");
        Ok(account)
    }
}
