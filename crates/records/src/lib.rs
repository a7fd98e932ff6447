//! Record models for the front desk: patients, visits and discharge summaries.
//!
//! This crate provides the **domain-level types** stored by the record store and the
//! **YAML translation helpers** used to read and write them:
//! - [`PatientRecord`] / [`PatientYaml`]
//! - [`VisitRecord`] / [`VisitYaml`]
//! - [`DischargeSummaryRecord`] / [`DischargeSummaryYaml`]
//!
//! Closed vocabularies (gender, status, visit categories, discharge type) are enums whose
//! wire spelling matches the labels used on the front desk forms.
//!
//! No I/O happens here. Paths and directories belong to `frontdesk-core`.

/// Implements `as_str`, `Display` and `FromStr` for a closed vocabulary enum.
///
/// `FromStr` accepts the wire spelling case-insensitively and reports the allowed values
/// on failure.
macro_rules! vocabulary {
    ($ty:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            /// All values, in form display order.
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Returns the wire spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::RecordsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| {
                        let allowed: Vec<&str> = $ty::ALL.iter().map(|v| v.as_str()).collect();
                        $crate::RecordsError::InvalidInput(format!(
                            "unknown {} '{}' (expected one of: {})",
                            stringify!($ty),
                            s,
                            allowed.join(", ")
                        ))
                    })
            }
        }
    };
}

pub(crate) use vocabulary;

pub mod discharge;
pub mod patient;
pub mod visit;
mod yaml;

pub use discharge::{DischargeSummaryRecord, DischargeSummaryYaml, DischargeType, NarrativeField};
pub use patient::{Gender, PatientRecord, PatientStatus, PatientYaml};
pub use visit::{CheckupType, HealthcareService, OxygenSaturation, VisitRecord, VisitYaml, Weight};

pub use frontdesk_ids::PatientId;
pub use frontdesk_types::NonEmptyText;

/// Errors returned by the `records` crate.
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`RecordsError`].
pub type RecordsResult<T> = Result<T, RecordsError>;
