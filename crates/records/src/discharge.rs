//! Discharge summary records.
//!
//! A discharge summary is written once at the end of an inpatient stay and is immutable
//! afterwards. It carries administrative fields (ward, bed, consultant, dates, discharge
//! category) and a fixed set of narrative sections, of which only the final diagnosis is
//! mandatory.

use crate::{yaml, RecordsResult};
use chrono::{DateTime, NaiveDate, Utc};
use frontdesk_ids::PatientId;
use frontdesk_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// How the patient left the hospital.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DischargeType {
    #[default]
    Planned,
    #[serde(rename = "DAMA")]
    Dama,
    #[serde(rename = "DOR")]
    Dor,
    #[serde(rename = "LAMA")]
    Lama,
}

vocabulary!(DischargeType {
    Planned => "Planned",
    Dama => "DAMA",
    Dor => "DOR",
    Lama => "LAMA",
});

impl DischargeType {
    /// Human-readable label printed on the summary.
    pub fn label(&self) -> &'static str {
        match self {
            DischargeType::Planned => "Planned",
            DischargeType::Dama => "Discharged Against Medical Advice",
            DischargeType::Dor => "Discharged on Request",
            DischargeType::Lama => "Left Against Medical Advice",
        }
    }
}

/// Narrative sections of a discharge summary, in the order they are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NarrativeField {
    FinalDiagnosis,
    ProceduresDone,
    ClinicalExamination,
    Consultations,
    ChiefComplaints,
    PastHistory,
    HospitalCourse,
    ConditionOnDischarge,
    DischargeAdvice,
    DietAdvice,
    FollowUp,
    EmergencyInstructions,
}

impl NarrativeField {
    pub const ALL: [NarrativeField; 12] = [
        NarrativeField::FinalDiagnosis,
        NarrativeField::ProceduresDone,
        NarrativeField::ClinicalExamination,
        NarrativeField::Consultations,
        NarrativeField::ChiefComplaints,
        NarrativeField::PastHistory,
        NarrativeField::HospitalCourse,
        NarrativeField::ConditionOnDischarge,
        NarrativeField::DischargeAdvice,
        NarrativeField::DietAdvice,
        NarrativeField::FollowUp,
        NarrativeField::EmergencyInstructions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NarrativeField::FinalDiagnosis => "Final Diagnosis",
            NarrativeField::ProceduresDone => "Procedures Done",
            NarrativeField::ClinicalExamination => "Clinical Examination",
            NarrativeField::Consultations => "Consultations",
            NarrativeField::ChiefComplaints => "Chief Complaints",
            NarrativeField::PastHistory => "Past History",
            NarrativeField::HospitalCourse => "Hospital Course",
            NarrativeField::ConditionOnDischarge => "Condition on Discharge",
            NarrativeField::DischargeAdvice => "Discharge Advice",
            NarrativeField::DietAdvice => "Diet Advice",
            NarrativeField::FollowUp => "Follow Up",
            NarrativeField::EmergencyInstructions => "Emergency Instructions",
        }
    }
}

/// A discharge summary for one inpatient stay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DischargeSummaryRecord {
    /// Internal sequence key; also used in the exported document's file name.
    pub id: u64,
    pub patient_id: PatientId,
    /// Unique hospital identifier printed on the summary.
    pub uhid: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bed_no: Option<String>,
    pub consultant_name: NonEmptyText,
    pub admission_date: NaiveDate,
    pub discharge_date: NaiveDate,
    #[serde(default)]
    pub discharge_type: DischargeType,

    pub final_diagnosis: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedures_done: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_examination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chief_complaints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_course: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_on_discharge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diet_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_instructions: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl DischargeSummaryRecord {
    /// Returns the text of a narrative section, `None` when it was not provided.
    pub fn narrative(&self, field: NarrativeField) -> Option<&str> {
        let value = match field {
            NarrativeField::FinalDiagnosis => return Some(self.final_diagnosis.as_str()),
            NarrativeField::ProceduresDone => &self.procedures_done,
            NarrativeField::ClinicalExamination => &self.clinical_examination,
            NarrativeField::Consultations => &self.consultations,
            NarrativeField::ChiefComplaints => &self.chief_complaints,
            NarrativeField::PastHistory => &self.past_history,
            NarrativeField::HospitalCourse => &self.hospital_course,
            NarrativeField::ConditionOnDischarge => &self.condition_on_discharge,
            NarrativeField::DischargeAdvice => &self.discharge_advice,
            NarrativeField::DietAdvice => &self.diet_advice,
            NarrativeField::FollowUp => &self.follow_up,
            NarrativeField::EmergencyInstructions => &self.emergency_instructions,
        };
        value.as_deref()
    }

    /// Length of stay in days (zero for same-day discharge).
    pub fn length_of_stay_days(&self) -> i64 {
        (self.discharge_date - self.admission_date).num_days()
    }
}

/// Discharge summary YAML operations.
pub struct DischargeSummaryYaml;

impl DischargeSummaryYaml {
    pub fn parse(yaml_text: &str) -> RecordsResult<DischargeSummaryRecord> {
        yaml::parse("DischargeSummary", yaml_text)
    }

    pub fn render(record: &DischargeSummaryRecord) -> RecordsResult<String> {
        yaml::render(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        "id: 4\npatient_id: PO00003\nuhid: UH-77\nconsultant_name: Dr Iyer\n\
         admission_date: 2026-02-01\ndischarge_date: 2026-02-05\n\
         final_diagnosis: Community acquired pneumonia\ncreated_at: 2026-02-05T12:00:00Z\n"
    }

    #[test]
    fn test_parse_defaults_discharge_type_to_planned() {
        let record = DischargeSummaryYaml::parse(minimal_yaml()).unwrap();
        assert_eq!(record.discharge_type, DischargeType::Planned);
        assert_eq!(record.ward, None);
        assert_eq!(record.length_of_stay_days(), 4);
    }

    #[test]
    fn test_narrative_follows_display_order() {
        let mut record = DischargeSummaryYaml::parse(minimal_yaml()).unwrap();
        record.diet_advice = Some("Soft diet".into());

        let labels: Vec<&str> = NarrativeField::ALL.iter().map(|f| f.label()).collect();
        assert_eq!(labels.first(), Some(&"Final Diagnosis"));
        assert_eq!(labels.last(), Some(&"Emergency Instructions"));

        assert_eq!(
            record.narrative(NarrativeField::FinalDiagnosis),
            Some("Community acquired pneumonia")
        );
        assert_eq!(record.narrative(NarrativeField::DietAdvice), Some("Soft diet"));
        assert_eq!(record.narrative(NarrativeField::FollowUp), None);
    }

    #[test]
    fn test_discharge_type_wire_and_label() {
        let dama: DischargeType = "dama".parse().unwrap();
        assert_eq!(dama, DischargeType::Dama);
        assert_eq!(dama.as_str(), "DAMA");
        assert_eq!(dama.label(), "Discharged Against Medical Advice");

        let yaml = minimal_yaml().to_string() + "discharge_type: LAMA\n";
        let record = DischargeSummaryYaml::parse(&yaml).unwrap();
        assert_eq!(record.discharge_type, DischargeType::Lama);
    }

    #[test]
    fn test_parse_requires_final_diagnosis() {
        let yaml = minimal_yaml().replace("final_diagnosis: Community acquired pneumonia\n", "");
        let err = DischargeSummaryYaml::parse(&yaml).unwrap_err();
        assert!(err.to_string().contains("final_diagnosis"), "{err}");
    }
}
