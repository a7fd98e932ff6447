//! Human-readable patient identifiers.
//!
//! Every patient registered at the front desk receives a sequential identifier of the form
//! `PO` followed by a zero-padded integer:
//!
//! - Prefix: `PO`
//! - Suffix: the integer, padded with leading zeros to at least 5 digits
//! - Examples: `PO00001`, `PO00042`, `PO100000`
//!
//! The padding is a *minimum* width. Once the sequence passes `99999` the identifier grows
//! (`PO99999` is followed by `PO100000`); it never truncates or wraps.
//!
//! This crate provides:
//! - [`PatientId`], a validated identifier type
//! - [`allocate_next_id`], the pure allocation step used when a patient is created
//!
//! Allocation has no side effects. Persisting the returned identifier, and rejecting a
//! second writer that computed the same value, is the record store's job.

mod patient_id;

pub use patient_id::{allocate_next_id, PatientId, PATIENT_ID_PREFIX, PATIENT_ID_WIDTH};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The identifier text does not have the `PO<digits>` shape
    #[error("malformed patient identifier: {0}")]
    Format(String),
    /// The numeric suffix cannot be incremented any further
    #[error("patient identifier sequence exhausted after {0}")]
    Overflow(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
