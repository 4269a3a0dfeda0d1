//! Application configuration loaded from environment variables.
//!
//! Backend project identifiers and the administrator allow-list are
//! deployment configuration, read once at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (Firestore + Identity Toolkit project)
    pub gcp_project_id: String,
    /// Firebase Web API key (public, identifies the project to Identity Toolkit)
    pub firebase_api_key: String,
    /// OAuth client ID expected as the audience of Google ID tokens
    pub google_oauth_client_id: String,
    /// Frontend URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Emails that are granted admin access without a profile-role check
    pub admin_emails: Vec<String>,
    /// The single address allowed to unlock super-admin mode
    pub super_admin_email: String,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?,
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            google_oauth_client_id: env::var("GOOGLE_OAUTH_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_OAUTH_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|v| parse_email_list(&v))
                .unwrap_or_default(),
            super_admin_email: env::var("SUPER_ADMIN_EMAIL")
                .map(|v| v.trim().to_lowercase())
                .map_err(|_| ConfigError::Missing("SUPER_ADMIN_EMAIL"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Check whether an email is on the static administrator allow-list.
    pub fn is_allow_listed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.admin_emails.iter().any(|a| a == &email)
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            google_oauth_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            admin_emails: vec!["ops@psia.test".to_string()],
            super_admin_email: "root@psia.test".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_email_list() {
        let emails = parse_email_list(" Ops@psia.test, admin@psia.test ,,dev@psia.test");
        assert_eq!(
            emails,
            vec!["ops@psia.test", "admin@psia.test", "dev@psia.test"]
        );
    }

    #[test]
    fn test_allow_list_is_case_insensitive() {
        let config = Config::test_default();
        assert!(config.is_allow_listed("OPS@psia.test"));
        assert!(!config.is_allow_listed("nobody@psia.test"));
    }
}
