//! Patient registration records.
//!
//! A patient record is created once at the front desk and may later be edited. Its
//! `patient_id` is assigned at creation and never changes; `record_number` is the internal
//! insertion-order key that decides which patient is "the most recent one" when the next
//! identifier is allocated.

use crate::{yaml, RecordsResult};
use chrono::{DateTime, Utc};
use frontdesk_ids::PatientId;
use frontdesk_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// Administrative gender as captured on the registration form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

vocabulary!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

/// Care status of a registered patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientStatus {
    Active,
    #[serde(rename = "Follow-up")]
    FollowUp,
    Chronic,
}

vocabulary!(PatientStatus {
    Active => "Active",
    FollowUp => "Follow-up",
    Chronic => "Chronic",
});

/// A registered patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    /// Insertion-order key, starting at 1.
    pub record_number: u64,
    /// Human-readable identifier, for example `PO00042`.
    pub patient_id: PatientId,
    pub name: NonEmptyText,
    pub age: u8,
    pub gender: Gender,
    pub contact_number: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Label used by the patient search endpoint, e.g. `Asha Rao (42 yrs, Female)`.
    pub fn search_label(&self) -> String {
        format!("{} ({} yrs, {})", self.name, self.age, self.gender)
    }
}

/// Patient YAML operations.
///
/// Zero-sized namespace for parse/render of `patient.yaml`.
pub struct PatientYaml;

impl PatientYaml {
    /// Parse a patient record from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RecordsError::Translation`] naming the failing field when the YAML
    /// does not match the schema, including a malformed `patient_id`.
    pub fn parse(yaml_text: &str) -> RecordsResult<PatientRecord> {
        yaml::parse("Patient", yaml_text)
    }

    /// Render a patient record as YAML text.
    pub fn render(record: &PatientRecord) -> RecordsResult<String> {
        yaml::render(record)
    }
}
