//! # API Shared
//!
//! Shared utilities and definitions for the front desk API.
//!
//! Contains:
//! - Request and response types (`dto` module) with OpenAPI schemas
//! - Conversions between those types and the core record types
//! - Shared services like `HealthService`
//! - Role and API key checks
//!
//! Used by `api-rest` and the command line client.

pub mod auth;
pub mod convert;
pub mod dto;
pub mod health;

pub use auth::{AuthError, Role};
pub use dto::*;
pub use health::HealthService;
