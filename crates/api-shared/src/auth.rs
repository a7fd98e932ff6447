//! Caller roles and API key validation.
//!
//! Callers identify their role in the `x-user-role` header. Login and sessions happen
//! upstream; this crate only decides whether a role may perform an operation.

use std::str::FromStr;

pub const ROLE_HEADER: &str = "x-user-role";
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Doctor,
    Nurse,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing x-user-role header")]
    MissingRole,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("You are not authorized to access this page.")]
    Forbidden,
    #[error("missing API key")]
    MissingApiKey,
    #[error("invalid API key")]
    InvalidApiKey,
}

impl AuthError {
    /// `true` for failures that mean "who are you?" rather than "you may not".
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::Forbidden)
    }
}

/// Reads the caller role from the raw header value.
pub fn role_from_header(value: Option<&str>) -> Result<Role, AuthError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value.parse(),
        None => Err(AuthError::MissingRole),
    }
}

pub fn require_admin(role: Role) -> Result<(), AuthError> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Validates the provided API key against the configured one.
///
/// When no key is configured every request passes.
pub fn validate_api_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match provided {
        None => Err(AuthError::MissingApiKey),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AuthError::InvalidApiKey),
    }
}
