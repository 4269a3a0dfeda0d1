//! Account model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Account role stored in the profile document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
    Superadmin,
}

impl Role {
    /// Roles that grant access to the admin console.
    pub fn grants_admin_access(self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

/// Account profile stored in Firestore (`users` collection, keyed by uid).
///
/// No credential material is stored here; password verification is owned
/// entirely by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Platform user id (also the document id)
    pub uid: String,
    /// Display name
    pub name: String,
    pub email: String,
    /// Subscription length in months
    pub duration_months: u32,
    /// Subscription start, `DD/MM/YYYY`
    pub start_date: String,
    /// Subscription expiry, `DD/MM/YYYY`
    pub expiry_date: String,
    pub role: Role,
    /// When the account was provisioned
    #[serde(with = "firestore::serialize_as_timestamp")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Email of the admin who provisioned the account
    pub created_by: String,
}

/// Payload for provisioning a new account.
///
/// Password length is validated here before any network call; the identity
/// provider enforces its own minimum as well.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(range(min = 1, max = 120, message = "duration must be 1-120 months"))]
    pub duration_months: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateAccountRequest {
        CreateAccountRequest {
            name: "Ana Valencia".to_string(),
            email: "ana@psia.test".to_string(),
            password: "secret1".to_string(),
            duration_months: 3,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_short_password_rejected() {
        let mut req = valid_request();
        req.password = "abc12".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut req = valid_request();
        req.name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut req = valid_request();
        req.email = "not-an-email".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Superadmin).unwrap(), "\"superadmin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
