// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod account;
pub mod usage;

pub use account::{Account, CreateAccountRequest, Role};
pub use usage::{DashboardStats, UsageEvent};
