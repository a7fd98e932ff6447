//! JSON request and response bodies.
//!
//! Dates travel as `YYYY-MM-DD` strings and timestamps as RFC 3339 strings. Closed
//! vocabularies travel as their form labels (`Female`, `Follow-up`, `OPD`, `DAMA`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub patient_id: String,
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub contact_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<String>,
    pub status: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<Patient>,
}

/// Body of patient registration and edit requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientReq {
    pub name: String,
    pub age: u16,
    pub gender: String,
    pub contact_number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    /// Defaults to `Active`.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NextPatientIdRes {
    pub patient_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub id: String,
    /// `<name> (<age> yrs, <gender>)`
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchRes {
    pub results: Vec<SearchHit>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientSummaryRes {
    pub name: String,
    pub patient_id: String,
    pub age: u8,
    pub status: String,
    pub last_visit: Option<String>,
}

/// Fields used to auto-fill forms once a patient is picked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PatientDetailsRes {
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub contact_number: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Visit {
    pub visit_number: u64,
    pub patient_id: String,
    pub doctor_name: String,
    pub date: String,
    pub checkup_type: String,
    pub healthcare_service: String,
    pub blood_pressure: String,
    pub oxygen_level: u8,
    pub weight: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VisitReq {
    pub patient_id: String,
    pub doctor_name: String,
    pub date: String,
    pub checkup_type: String,
    pub healthcare_service: String,
    pub blood_pressure: String,
    /// Percentage, with or without a trailing `%`.
    pub oxygen_level: String,
    /// Kilograms with at most two decimals, e.g. `64.50`.
    pub weight: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VisitHistoryItem {
    pub patient_name: String,
    pub visit: Visit,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VisitHistoryRes {
    pub visits: Vec<VisitHistoryItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DischargeSummary {
    pub id: u64,
    pub patient_id: String,
    pub uhid: String,
    pub ip_id: Option<String>,
    pub ward: Option<String>,
    pub bed_no: Option<String>,
    pub consultant_name: String,
    pub admission_date: String,
    pub discharge_date: String,
    pub discharge_type: String,
    pub discharge_type_label: String,
    pub final_diagnosis: String,
    pub procedures_done: Option<String>,
    pub clinical_examination: Option<String>,
    pub consultations: Option<String>,
    pub chief_complaints: Option<String>,
    pub past_history: Option<String>,
    pub hospital_course: Option<String>,
    pub condition_on_discharge: Option<String>,
    pub discharge_advice: Option<String>,
    pub diet_advice: Option<String>,
    pub follow_up: Option<String>,
    pub emergency_instructions: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListDischargesRes {
    pub summaries: Vec<DischargeSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DischargeReq {
    pub patient_id: String,
    pub uhid: String,
    #[serde(default)]
    pub ip_id: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub bed_no: Option<String>,
    pub consultant_name: String,
    pub admission_date: String,
    pub discharge_date: String,
    /// `Planned` (default), `DAMA`, `DOR` or `LAMA`.
    #[serde(default)]
    pub discharge_type: Option<String>,
    pub final_diagnosis: String,
    #[serde(default)]
    pub procedures_done: Option<String>,
    #[serde(default)]
    pub clinical_examination: Option<String>,
    #[serde(default)]
    pub consultations: Option<String>,
    #[serde(default)]
    pub chief_complaints: Option<String>,
    #[serde(default)]
    pub past_history: Option<String>,
    #[serde(default)]
    pub hospital_course: Option<String>,
    #[serde(default)]
    pub condition_on_discharge: Option<String>,
    #[serde(default)]
    pub discharge_advice: Option<String>,
    #[serde(default)]
    pub diet_advice: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
    #[serde(default)]
    pub emergency_instructions: Option<String>,
}
