// SPDX-License-Identifier: MIT

pub mod access;
pub mod accounts;
pub mod analytics;
pub mod cache;
pub mod identity;
pub mod oidc;
pub mod report;

pub use access::{resolve_admin_access, AccessDecision};
pub use accounts::AccountService;
pub use cache::DataCache;
pub use identity::IdentityClient;
pub use oidc::{GoogleOidcVerifier, OidcError, VerifiedGoogleIdentity};
