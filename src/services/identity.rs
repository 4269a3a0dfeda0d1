// SPDX-License-Identifier: MIT

//! Firebase Auth (Identity Toolkit) REST client.
//!
//! Handles:
//! - Email/password sign-in for staff login
//! - Credential creation during account provisioning
//! - Credential deletion, two ways: with the credential's own ID token
//!   (rollback path right after sign-up) and via the project admin endpoint
//!   (account deletion workflow, authorized by the service's own Google
//!   credentials)
//!
//! Sign-up happens against the provider directly, so the admin's session is
//! never touched: the returned ID token is an isolated, short-lived value
//! scoped to the provisioning call.

use crate::error::AppError;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit client.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    project_id: String,
    admin_tokens: Option<Arc<gcloud_sdk::GoogleAuthTokenGenerator>>,
}

/// A freshly created credential, scoped to one provisioning call.
///
/// The ID token authenticates only the new user and is dropped when the
/// workflow finishes; it is what the rollback path uses to delete the
/// credential without admin rights.
#[derive(Debug, Clone)]
pub struct ProvisionedCredential {
    pub local_id: String,
    pub id_token: String,
}

/// Result of a successful password sign-in.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub local_id: String,
    pub email: String,
}

impl IdentityClient {
    /// Create a client without admin credentials (sign-in/sign-up only).
    pub fn new(api_key: String, project_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            project_id,
            admin_tokens: None,
        }
    }

    /// Create a client that can also call the project admin endpoints
    /// (credential deletion by uid), using the service's Google credentials.
    pub async fn new_with_admin(api_key: String, project_id: String) -> Result<Self, AppError> {
        let generator = gcloud_sdk::GoogleAuthTokenGenerator::new(
            gcloud_sdk::TokenSourceType::Default,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        )
        .await
        .map_err(|e| AppError::IdentityApi(format!("Failed to init admin credentials: {}", e)))?;

        Ok(Self {
            admin_tokens: Some(Arc::new(generator)),
            ..Self::new(api_key, project_id)
        })
    }

    /// Create a client pointed at a mock server (tests only).
    pub fn new_mock(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: "test_api_key".to_string(),
            project_id: "test-project".to_string(),
            admin_tokens: None,
        }
    }

    /// Create a new email/password credential.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProvisionedCredential, AppError> {
        let url = format!("{}/accounts:signUp?key={}", self.base_url, self.api_key);

        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response: AuthTokenResponse = self.post_json(&url, &body).await?;

        Ok(ProvisionedCredential {
            local_id: response.local_id,
            id_token: response.id_token,
        })
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignedInUser, AppError> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.base_url, self.api_key
        );

        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response: AuthTokenResponse = self.post_json(&url, &body).await?;

        Ok(SignedInUser {
            local_id: response.local_id,
            email: response.email.unwrap_or_else(|| email.to_string()),
        })
    }

    /// Delete a credential using its own ID token.
    ///
    /// Used to roll back a just-created credential when the profile write
    /// fails; needs no admin rights.
    pub async fn delete_with_token(&self, id_token: &str) -> Result<(), AppError> {
        let url = format!("{}/accounts:delete?key={}", self.base_url, self.api_key);

        let body = serde_json::json!({ "idToken": id_token });
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IdentityApi(e.to_string()))?;

        self.check_response(response).await
    }

    /// Delete a credential by uid via the project admin endpoint.
    pub async fn admin_delete(&self, local_id: &str) -> Result<(), AppError> {
        let generator = self.admin_tokens.as_ref().ok_or_else(|| {
            AppError::IdentityApi("Admin credentials not configured".to_string())
        })?;

        let token = generator
            .create_token()
            .await
            .map_err(|e| AppError::IdentityApi(format!("Failed to mint admin token: {}", e)))?;

        let url = format!(
            "{}/projects/{}/accounts:delete",
            self.base_url, self.project_id
        );

        let body = serde_json::json!({ "localId": local_id });
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, token.header_value())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IdentityApi(e.to_string()))?;

        self.check_response(response).await
    }

    /// POST a JSON body and parse a JSON response, mapping provider error
    /// codes to the application taxonomy.
    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::IdentityApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(self.error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IdentityApi(format!("JSON parse error: {}", e)))
    }

    /// Check response status, mapping failures to the error taxonomy.
    async fn check_response(&self, response: reqwest::Response) -> Result<(), AppError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(self.error_from_response(response).await)
    }

    async fn error_from_response(&self, response: reqwest::Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(parsed) = serde_json::from_str::<IdentityErrorBody>(&body) {
            return map_identity_error(&parsed.error.message);
        }

        AppError::IdentityApi(format!("HTTP {}: {}", status, body))
    }
}

/// Map an Identity Toolkit error code to the application taxonomy.
fn map_identity_error(code: &str) -> AppError {
    // Codes can carry a suffix like "WEAK_PASSWORD : ...", keep the prefix.
    let code = code.split_whitespace().next().unwrap_or(code);

    match code {
        "EMAIL_EXISTS" => AppError::DuplicateEmail,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AppError::InvalidCredentials
        }
        "USER_DISABLED" => AppError::Forbidden("account disabled".to_string()),
        "WEAK_PASSWORD" => AppError::BadRequest("password too weak".to_string()),
        other => AppError::IdentityApi(format!("Identity Toolkit error: {}", other)),
    }
}

/// Token response shared by signUp and signInWithPassword.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthTokenResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error: IdentityErrorDetail,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_email_maps_to_conflict() {
        assert!(matches!(
            map_identity_error("EMAIL_EXISTS"),
            AppError::DuplicateEmail
        ));
    }

    #[test]
    fn test_bad_credentials_map_to_invalid_credentials() {
        for code in ["EMAIL_NOT_FOUND", "INVALID_PASSWORD", "INVALID_LOGIN_CREDENTIALS"] {
            assert!(matches!(
                map_identity_error(code),
                AppError::InvalidCredentials
            ));
        }
    }

    #[test]
    fn test_suffixed_code_is_recognized() {
        assert!(matches!(
            map_identity_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_unknown_code_is_provider_error() {
        assert!(matches!(
            map_identity_error("OPERATION_NOT_ALLOWED"),
            AppError::IdentityApi(_)
        ));
    }

    #[test]
    fn test_error_body_parses() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        let parsed: IdentityErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "EMAIL_EXISTS");
    }
}
