// SPDX-License-Identifier: MIT

pub mod auth;
pub mod security;

pub use auth::{
    create_session_jwt, decode_session_jwt, require_auth, require_super_admin, AuthAdmin, Claims,
    SESSION_COOKIE,
};
pub use security::add_security_headers;
