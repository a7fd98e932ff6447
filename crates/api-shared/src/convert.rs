//! Conversions between API bodies and core record types.

use crate::dto::{DischargeReq, DischargeSummary, Patient, PatientReq, Visit, VisitReq};
use frontdesk_core::validation::parse_date;
use frontdesk_core::{
    NewDischargeSummary, NewPatient, NewVisit, PatientId, RecordError, RecordResult,
};
use records::{DischargeSummaryRecord, PatientRecord, PatientStatus, RecordsError, VisitRecord};
use std::str::FromStr;

fn invalid(err: RecordsError) -> RecordError {
    match err {
        RecordsError::InvalidInput(message) => RecordError::InvalidInput(message),
        other => RecordError::InvalidInput(other.to_string()),
    }
}

fn vocabulary<T>(value: &str) -> RecordResult<T>
where
    T: FromStr<Err = RecordsError>,
{
    value.parse().map_err(invalid)
}

/// Parses a patient identifier supplied by a client.
///
/// Only the canonical spelling is accepted, so `PO1` never aliases `PO00001`.
pub fn parse_patient_id(value: &str) -> RecordResult<PatientId> {
    PatientId::parse_canonical(value.trim())
        .map_err(|err| RecordError::InvalidInput(err.to_string()))
}

impl From<&PatientRecord> for Patient {
    fn from(record: &PatientRecord) -> Self {
        Self {
            patient_id: record.patient_id.to_string(),
            name: record.name.to_string(),
            age: record.age,
            gender: record.gender.to_string(),
            contact_number: record.contact_number.to_string(),
            email: record.email.clone(),
            address: record.address.clone(),
            medical_history: record.medical_history.clone(),
            status: record.status.to_string(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl From<&VisitRecord> for Visit {
    fn from(record: &VisitRecord) -> Self {
        Self {
            visit_number: record.visit_number,
            patient_id: record.patient_id.to_string(),
            doctor_name: record.doctor_name.to_string(),
            date: record.date.to_string(),
            checkup_type: record.checkup_type.to_string(),
            healthcare_service: record.healthcare_service.to_string(),
            blood_pressure: record.blood_pressure.to_string(),
            oxygen_level: record.oxygen_level.percent(),
            weight: record.weight.to_string(),
            notes: record.notes.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl From<&DischargeSummaryRecord> for DischargeSummary {
    fn from(record: &DischargeSummaryRecord) -> Self {
        Self {
            id: record.id,
            patient_id: record.patient_id.to_string(),
            uhid: record.uhid.to_string(),
            ip_id: record.ip_id.clone(),
            ward: record.ward.clone(),
            bed_no: record.bed_no.clone(),
            consultant_name: record.consultant_name.to_string(),
            admission_date: record.admission_date.to_string(),
            discharge_date: record.discharge_date.to_string(),
            discharge_type: record.discharge_type.to_string(),
            discharge_type_label: record.discharge_type.label().to_string(),
            final_diagnosis: record.final_diagnosis.to_string(),
            procedures_done: record.procedures_done.clone(),
            clinical_examination: record.clinical_examination.clone(),
            consultations: record.consultations.clone(),
            chief_complaints: record.chief_complaints.clone(),
            past_history: record.past_history.clone(),
            hospital_course: record.hospital_course.clone(),
            condition_on_discharge: record.condition_on_discharge.clone(),
            discharge_advice: record.discharge_advice.clone(),
            diet_advice: record.diet_advice.clone(),
            follow_up: record.follow_up.clone(),
            emergency_instructions: record.emergency_instructions.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl PatientReq {
    pub fn into_new_patient(self) -> RecordResult<NewPatient> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => PatientStatus::Active,
            Some(value) => vocabulary(value)?,
        };

        Ok(NewPatient {
            name: self.name,
            age: self.age,
            gender: vocabulary(&self.gender)?,
            contact_number: self.contact_number,
            email: self.email,
            address: self.address,
            medical_history: self.medical_history,
            status,
        })
    }
}

impl VisitReq {
    pub fn into_new_visit(self) -> RecordResult<NewVisit> {
        Ok(NewVisit {
            patient_id: parse_patient_id(&self.patient_id)?,
            doctor_name: self.doctor_name,
            date: parse_date("date", &self.date)?,
            checkup_type: vocabulary(&self.checkup_type)?,
            healthcare_service: vocabulary(&self.healthcare_service)?,
            blood_pressure: self.blood_pressure,
            oxygen_level: vocabulary(&self.oxygen_level)?,
            weight: vocabulary(&self.weight)?,
            notes: self.notes,
        })
    }
}

impl DischargeReq {
    pub fn into_new_discharge(self) -> RecordResult<NewDischargeSummary> {
        let discharge_type = match self.discharge_type.as_deref().map(str::trim) {
            None | Some("") => Default::default(),
            Some(value) => vocabulary(value)?,
        };

        Ok(NewDischargeSummary {
            patient_id: Some(parse_patient_id(&self.patient_id)?),
            uhid: self.uhid,
            ip_id: self.ip_id,
            ward: self.ward,
            bed_no: self.bed_no,
            consultant_name: self.consultant_name,
            admission_date: Some(parse_date("admission_date", &self.admission_date)?),
            discharge_date: Some(parse_date("discharge_date", &self.discharge_date)?),
            discharge_type,
            final_diagnosis: self.final_diagnosis,
            procedures_done: self.procedures_done,
            clinical_examination: self.clinical_examination,
            consultations: self.consultations,
            chief_complaints: self.chief_complaints,
            past_history: self.past_history,
            hospital_course: self.hospital_course,
            condition_on_discharge: self.condition_on_discharge,
            discharge_advice: self.discharge_advice,
            diet_advice: self.diet_advice,
            follow_up: self.follow_up,
            emergency_instructions: self.emergency_instructions,
        })
    }
}
