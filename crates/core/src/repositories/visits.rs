//! Visit logging.
//!
//! Visits live under their patient's directory, one YAML file per visit named by its
//! per-patient visit number (`patients/PO00001/visits/3.yaml`). Visits are never edited.

use crate::config::CoreConfig;
use crate::constants::{BLOOD_PRESSURE_MAX_LEN, VISIT_HISTORY_PATIENTS};
use crate::error::{RecordError, RecordResult};
use crate::paths::{PatientFile, VisitFile};
use crate::repositories::patients::PatientService;
use crate::repositories::shared::{
    load_all, next_numeric_key, numeric_key, read_dir_paths, try_create_file,
};
use crate::validation::{bounded_text, optional_text, required_text};
use chrono::{NaiveDate, Utc};
use frontdesk_ids::PatientId;
use records::{
    CheckupType, HealthcareService, OxygenSaturation, PatientRecord, VisitRecord, VisitYaml,
    Weight,
};
use std::fs;
use std::sync::Arc;

/// Fields supplied when logging a visit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewVisit {
    pub patient_id: PatientId,
    pub doctor_name: String,
    pub date: NaiveDate,
    pub checkup_type: CheckupType,
    pub healthcare_service: HealthcareService,
    pub blood_pressure: String,
    pub oxygen_level: OxygenSaturation,
    pub weight: Weight,
    pub notes: Option<String>,
}

/// A visit together with the patient it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VisitHistoryEntry {
    pub patient: PatientRecord,
    pub visit: VisitRecord,
}

#[derive(Clone, Debug)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
    patients: PatientService,
}

impl VisitService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let patients = PatientService::new(cfg.clone());
        Self { cfg, patients }
    }

    /// Logs a visit for an existing patient.
    ///
    /// # Errors
    ///
    /// - `RecordError::NotFound` if the patient does not exist
    /// - `RecordError::InvalidInput` if a field fails validation
    /// - `RecordError::KeyConflict` if another writer took the visit number first
    pub fn create(&self, new: NewVisit) -> RecordResult<VisitRecord> {
        let doctor_name = required_text("doctor_name", &new.doctor_name)?;
        let blood_pressure =
            bounded_text("blood_pressure", &new.blood_pressure, BLOOD_PRESSURE_MAX_LEN)?;

        if !self.patients.exists(&new.patient_id) {
            return Err(RecordError::patient_not_found(&new.patient_id));
        }

        let visits_dir = self.visits_dir(&new.patient_id);
        fs::create_dir_all(&visits_dir).map_err(RecordError::StorageDirCreation)?;
        let visit_number = next_numeric_key(&visits_dir, Some(VisitFile::EXTENSION))?;

        let record = VisitRecord {
            visit_number,
            patient_id: new.patient_id,
            doctor_name,
            date: new.date,
            checkup_type: new.checkup_type,
            healthcare_service: new.healthcare_service,
            blood_pressure,
            oxygen_level: new.oxygen_level,
            weight: new.weight,
            notes: optional_text(new.notes),
            created_at: Utc::now(),
        };

        let yaml = VisitYaml::render(&record)?;
        if !try_create_file(&visits_dir.join(VisitFile::file_name(visit_number)), &yaml)? {
            return Err(RecordError::KeyConflict {
                kind: "visit",
                key: visit_number,
            });
        }

        tracing::info!(patient_id = %record.patient_id, visit_number, "logged visit");
        Ok(record)
    }

    /// All visits of one patient, newest date first.
    pub fn list_for_patient(&self, patient_id: &PatientId) -> RecordResult<Vec<VisitRecord>> {
        if !self.patients.exists(patient_id) {
            return Err(RecordError::patient_not_found(patient_id));
        }

        let files = read_dir_paths(&self.visits_dir(patient_id))?
            .into_iter()
            .filter(|path| numeric_key(path, Some(VisitFile::EXTENSION)).is_some());

        let mut visits = load_all(files, VisitYaml::parse);
        sort_newest_first(&mut visits, |v| v);
        Ok(visits)
    }

    /// Date of the patient's most recent visit.
    pub fn last_visit_date(&self, patient_id: &PatientId) -> RecordResult<Option<NaiveDate>> {
        Ok(self
            .list_for_patient(patient_id)?
            .first()
            .map(|visit| visit.date))
    }

    /// Visit history of the most recently registered patients, newest date first.
    pub fn recent_history(&self) -> RecordResult<Vec<VisitHistoryEntry>> {
        let mut entries = Vec::new();
        for patient in self.patients.most_recent(VISIT_HISTORY_PATIENTS)? {
            for visit in self.list_for_patient(&patient.patient_id)? {
                entries.push(VisitHistoryEntry {
                    patient: patient.clone(),
                    visit,
                });
            }
        }
        sort_newest_first(&mut entries, |entry| &entry.visit);
        Ok(entries)
    }

    fn visits_dir(&self, patient_id: &PatientId) -> std::path::PathBuf {
        VisitFile::dir(&PatientFile::dir(&self.cfg.patients_dir(), patient_id))
    }
}

fn sort_newest_first<T>(items: &mut [T], visit: impl Fn(&T) -> &VisitRecord) {
    items.sort_by(|a, b| {
        let (a, b) = (visit(a), visit(b));
        b.date
            .cmp(&a.date)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.visit_number.cmp(&a.visit_number))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::patients::tests::new_patient;
    use crate::test_support::config_in;
    use tempfile::TempDir;

    fn new_visit(patient_id: PatientId, date: &str) -> NewVisit {
        NewVisit {
            patient_id,
            doctor_name: "Dr Suresh Pillai".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            checkup_type: CheckupType::Regular,
            healthcare_service: HealthcareService::Opd,
            blood_pressure: "120/80 mmHg".into(),
            oxygen_level: "98%".parse().unwrap(),
            weight: "64.50".parse().unwrap(),
            notes: None,
        }
    }

    #[test]
    fn test_visit_numbers_are_per_patient() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let patients = PatientService::new(cfg.clone());
        let visits = VisitService::new(cfg.clone());
        let a = patients.create(new_patient("A")).unwrap().patient_id;
        let b = patients.create(new_patient("B")).unwrap().patient_id;

        assert_eq!(visits.create(new_visit(a, "2026-01-01")).unwrap().visit_number, 1);
        assert_eq!(visits.create(new_visit(a, "2026-01-02")).unwrap().visit_number, 2);
        assert_eq!(visits.create(new_visit(b, "2026-01-03")).unwrap().visit_number, 1);
        assert!(cfg.patients_dir().join("PO00001/visits/2.yaml").is_file());
    }

    #[test]
    fn test_visit_for_unknown_patient_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let visits = VisitService::new(config_in(&temp_dir));

        let err = visits
            .create(new_visit(PatientId::from_number(5), "2026-01-01"))
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound { kind: "patient", .. }));
    }

    #[test]
    fn test_visit_validation() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let id = PatientService::new(cfg.clone())
            .create(new_patient("A"))
            .unwrap()
            .patient_id;
        let visits = VisitService::new(cfg);

        let mut blank_doctor = new_visit(id, "2026-01-01");
        blank_doctor.doctor_name = " ".into();
        assert!(matches!(visits.create(blank_doctor), Err(RecordError::InvalidInput(_))));

        let mut long_bp = new_visit(id, "2026-01-01");
        long_bp.blood_pressure = "120/80 mmHg (sitting)".into();
        assert!(matches!(visits.create(long_bp), Err(RecordError::InvalidInput(_))));
    }

    #[test]
    fn test_recent_history_covers_two_newest_patients() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let patients = PatientService::new(cfg.clone());
        let visits = VisitService::new(cfg);
        let oldest = patients.create(new_patient("Oldest")).unwrap().patient_id;
        let middle = patients.create(new_patient("Middle")).unwrap().patient_id;
        let newest = patients.create(new_patient("Newest")).unwrap().patient_id;

        visits.create(new_visit(oldest, "2026-03-01")).unwrap();
        visits.create(new_visit(middle, "2026-01-15")).unwrap();
        visits.create(new_visit(newest, "2026-02-20")).unwrap();
        visits.create(new_visit(middle, "2026-02-25")).unwrap();

        let history: Vec<(String, String)> = visits
            .recent_history()
            .unwrap()
            .into_iter()
            .map(|e| (e.patient.name.to_string(), e.visit.date.to_string()))
            .collect();

        assert_eq!(
            history,
            vec![
                ("Middle".to_string(), "2026-02-25".to_string()),
                ("Newest".to_string(), "2026-02-20".to_string()),
                ("Middle".to_string(), "2026-01-15".to_string()),
            ]
        );
        assert_eq!(
            visits.last_visit_date(&middle).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 25)
        );

        let unseen = patients.create(new_patient("Unseen")).unwrap().patient_id;
        assert_eq!(visits.last_visit_date(&unseen).unwrap(), None);
    }
}
