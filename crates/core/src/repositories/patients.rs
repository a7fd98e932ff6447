//! Patient registration.
//!
//! Patients are stored one directory each, named by patient identifier:
//!
//! ```text
//! patients/
//!   PO00001/
//!     patient.yaml
//!     visits/
//!   PO00002/
//!     patient.yaml
//! ```
//!
//! The directory name doubles as the uniqueness guard for identifiers: allocation reads the
//! identifier of the most recently registered patient, and creating the directory for the
//! next one is atomic. A racing second writer gets [`RecordError::DuplicatePatientId`].
//! A directory left without `patient.yaml` by an interrupted registration is reported as
//! [`RecordError::UnfinishedRegistration`] so it can be cleaned up.

use crate::config::CoreConfig;
use crate::constants::{CONTACT_NUMBER_MAX_LEN, NAME_MAX_LEN, SEARCH_RESULT_LIMIT};
use crate::error::{RecordError, RecordResult};
use crate::paths::PatientFile;
use crate::repositories::shared::{
    fill_or_remove, load_all, read_dir_paths, read_record_file, try_create_dir, try_create_file,
};
use crate::validation::{bounded_text, optional_text, validate_age};
use chrono::Utc;
use frontdesk_ids::{allocate_next_id, PatientId};
use records::{Gender, PatientRecord, PatientStatus, PatientYaml};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Fields supplied when registering or editing a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub name: String,
    pub age: u16,
    pub gender: Gender,
    pub contact_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub status: PatientStatus,
}

/// The two fields needed to find the most recent patient.
///
/// `patient_id` stays a raw string so that a corrupt identifier surfaces as a format error
/// from the allocator instead of hiding the record.
#[derive(Deserialize)]
struct StoredPatientHeader {
    record_number: u64,
    patient_id: String,
}

/// Service for patient registration, lookup, editing and search.
#[derive(Clone, Debug)]
pub struct PatientService {
    cfg: Arc<CoreConfig>,
}

impl PatientService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Lists all readable patients in registration order.
    ///
    /// Unparseable `patient.yaml` files are logged and skipped.
    pub fn list(&self) -> RecordResult<Vec<PatientRecord>> {
        let files = read_dir_paths(&self.cfg.patients_dir())?
            .into_iter()
            .filter(|dir| dir.is_dir())
            .map(|dir| dir.join(PatientFile::NAME))
            .filter(|path| path.is_file());

        let mut patients = load_all(files, PatientYaml::parse);
        patients.sort_by_key(|p| p.record_number);
        Ok(patients)
    }

    /// Returns the patients registered most recently, newest first.
    pub fn most_recent(&self, count: usize) -> RecordResult<Vec<PatientRecord>> {
        let mut patients = self.list()?;
        patients.reverse();
        patients.truncate(count);
        Ok(patients)
    }

    /// Reads `(record_number, patient_id)` from every stored patient.
    fn headers(&self) -> RecordResult<Vec<StoredPatientHeader>> {
        let mut headers = Vec::new();
        for dir in read_dir_paths(&self.cfg.patients_dir())? {
            let path = dir.join(PatientFile::NAME);
            if !path.is_file() {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(RecordError::FileRead)?;
            match serde_yaml::from_str::<StoredPatientHeader>(&content) {
                Ok(header) => headers.push(header),
                Err(err) => {
                    tracing::warn!("skipping patient without header {}: {err}", path.display());
                }
            }
        }
        Ok(headers)
    }

    /// Identifier string of the patient with the highest record number, if any.
    pub fn latest_patient_id(&self) -> RecordResult<Option<String>> {
        Ok(self
            .headers()?
            .into_iter()
            .max_by_key(|h| h.record_number)
            .map(|h| h.patient_id))
    }

    /// Previews the identifier the next registration will receive.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Id` if the latest stored identifier is malformed.
    pub fn next_patient_id(&self) -> RecordResult<PatientId> {
        let latest = self.latest_patient_id()?;
        Ok(allocate_next_id(latest.as_deref())?)
    }

    /// Registers a new patient and assigns the next identifier.
    ///
    /// # Errors
    ///
    /// - `RecordError::InvalidInput` if a field fails validation
    /// - `RecordError::Id` if the latest stored identifier is malformed
    /// - `RecordError::DuplicatePatientId` if another writer claimed the identifier first
    /// - `RecordError::UnfinishedRegistration` if an interrupted registration left the
    ///   identifier's directory without a record
    /// - storage errors if the record cannot be written
    pub fn create(&self, new: NewPatient) -> RecordResult<PatientRecord> {
        let validated = ValidatedPatient::try_from(new)?;

        let headers = self.headers()?;
        let latest = headers.iter().max_by_key(|h| h.record_number);
        let patient_id = allocate_next_id(latest.map(|h| h.patient_id.as_str()))?;
        let record_number = latest.map_or(0, |h| h.record_number) + 1;

        let patient_dir = self.claim_patient_dir(&patient_id)?;

        let record = PatientRecord {
            record_number,
            patient_id,
            name: validated.name,
            age: validated.age,
            gender: validated.gender,
            contact_number: validated.contact_number,
            email: validated.email,
            address: validated.address,
            medical_history: validated.medical_history,
            status: validated.status,
            created_at: Utc::now(),
        };

        fill_or_remove(&patient_dir, || {
            let yaml = PatientYaml::render(&record)?;
            if !try_create_file(&patient_dir.join(PatientFile::NAME), &yaml)? {
                return Err(RecordError::DuplicatePatientId(patient_id));
            }
            Ok(())
        })?;

        tracing::info!(%patient_id, record_number, "registered patient");
        Ok(record)
    }

    /// Atomically creates the directory for `patient_id`.
    ///
    /// An existing directory holding a record belongs to another writer. One without a record
    /// was left behind by a registration that never finished writing.
    fn claim_patient_dir(&self, patient_id: &PatientId) -> RecordResult<PathBuf> {
        let patient_dir = PatientFile::dir(&self.cfg.patients_dir(), patient_id);
        if try_create_dir(&patient_dir)? {
            return Ok(patient_dir);
        }

        if patient_dir.join(PatientFile::NAME).is_file() {
            return Err(RecordError::DuplicatePatientId(*patient_id));
        }

        tracing::warn!(
            %patient_id,
            "patient directory {} has no record",
            patient_dir.display()
        );
        Err(RecordError::UnfinishedRegistration {
            patient_id: *patient_id,
            path: patient_dir,
        })
    }

    /// Loads a patient by identifier.
    pub fn get(&self, patient_id: &PatientId) -> RecordResult<PatientRecord> {
        let path = PatientFile::path(&self.cfg.patients_dir(), patient_id);
        let content = read_record_file(&path, || RecordError::patient_not_found(patient_id))?;
        Ok(PatientYaml::parse(&content)?)
    }

    pub fn exists(&self, patient_id: &PatientId) -> bool {
        PatientFile::path(&self.cfg.patients_dir(), patient_id).is_file()
    }

    /// Replaces the editable fields of a patient. The identifier, record number and
    /// creation time never change.
    pub fn update(&self, patient_id: &PatientId, changes: NewPatient) -> RecordResult<PatientRecord> {
        let mut record = self.get(patient_id)?;
        let validated = ValidatedPatient::try_from(changes)?;

        record.name = validated.name;
        record.age = validated.age;
        record.gender = validated.gender;
        record.contact_number = validated.contact_number;
        record.email = validated.email;
        record.address = validated.address;
        record.medical_history = validated.medical_history;
        record.status = validated.status;

        let yaml = PatientYaml::render(&record)?;
        fs::write(PatientFile::path(&self.cfg.patients_dir(), patient_id), yaml)
            .map_err(RecordError::FileWrite)?;

        tracing::info!(%patient_id, "updated patient");
        Ok(record)
    }

    /// Case-insensitive name search, ordered by name and capped at
    /// [`SEARCH_RESULT_LIMIT`] results. An empty term matches everyone.
    pub fn search(&self, term: &str) -> RecordResult<Vec<PatientRecord>> {
        let needle = term.trim().to_lowercase();
        let mut matches: Vec<PatientRecord> = self
            .list()?
            .into_iter()
            .filter(|p| p.name.as_str().to_lowercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            a.name
                .as_str()
                .to_lowercase()
                .cmp(&b.name.as_str().to_lowercase())
                .then(a.record_number.cmp(&b.record_number))
        });
        matches.truncate(SEARCH_RESULT_LIMIT);
        Ok(matches)
    }
}

struct ValidatedPatient {
    name: frontdesk_types::NonEmptyText,
    age: u8,
    gender: Gender,
    contact_number: frontdesk_types::NonEmptyText,
    email: Option<String>,
    address: Option<String>,
    medical_history: Option<String>,
    status: PatientStatus,
}

impl TryFrom<NewPatient> for ValidatedPatient {
    type Error = RecordError;

    fn try_from(new: NewPatient) -> RecordResult<Self> {
        Ok(Self {
            name: bounded_text("name", &new.name, NAME_MAX_LEN)?,
            age: validate_age(new.age)?,
            gender: new.gender,
            contact_number: bounded_text("contact_number", &new.contact_number, CONTACT_NUMBER_MAX_LEN)?,
            email: optional_text(new.email),
            address: optional_text(new.address),
            medical_history: optional_text(new.medical_history),
            status: new.status,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::config_in;
    use tempfile::TempDir;

    pub(crate) fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            age: 42,
            gender: Gender::Female,
            contact_number: "+91 90000 11111".into(),
            email: None,
            address: Some("12 MG Road".into()),
            medical_history: None,
            status: PatientStatus::Active,
        }
    }

    #[test]
    fn test_first_patient_gets_po00001() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let service = PatientService::new(cfg.clone());

        assert_eq!(service.next_patient_id().unwrap().to_string(), "PO00001");
        let patient = service.create(new_patient("Asha Rao")).unwrap();

        assert_eq!(patient.patient_id.to_string(), "PO00001");
        assert_eq!(patient.record_number, 1);
        assert!(cfg.patients_dir().join("PO00001/patient.yaml").is_file());
        assert_eq!(service.get(&patient.patient_id).unwrap(), patient);
    }

    #[test]
    fn test_identifiers_increase_in_registration_order() {
        let temp_dir = TempDir::new().unwrap();
        let service = PatientService::new(config_in(&temp_dir));

        let ids: Vec<String> = ["A", "B", "C"]
            .iter()
            .map(|name| service.create(new_patient(name)).unwrap().patient_id.to_string())
            .collect();

        assert_eq!(ids, vec!["PO00001", "PO00002", "PO00003"]);
        assert_eq!(service.next_patient_id().unwrap().to_string(), "PO00004");
        let listed: Vec<u64> = service.list().unwrap().iter().map(|p| p.record_number).collect();
        assert_eq!(listed, vec![1, 2, 3]);
    }

    #[test]
    fn test_racing_writer_gets_duplicate_error() {
        let temp_dir = TempDir::new().unwrap();
        let service = PatientService::new(config_in(&temp_dir));
        let first = service.create(new_patient("First")).unwrap();

        // A writer that scanned before PO00001 existed tries to claim the same identifier.
        let err = service.claim_patient_dir(&first.patient_id).unwrap_err();

        assert!(matches!(err, RecordError::DuplicatePatientId(id) if id.to_string() == "PO00001"));
        assert_eq!(service.get(&first.patient_id).unwrap(), first);
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_unfinished_registration_names_the_stale_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let service = PatientService::new(cfg.clone());
        service.create(new_patient("First")).unwrap();

        let stale = cfg.patients_dir().join("PO00002");
        fs::create_dir_all(&stale).unwrap();

        for _ in 0..2 {
            let err = service.create(new_patient("Second")).unwrap_err();
            match &err {
                RecordError::UnfinishedRegistration { patient_id, path } => {
                    assert_eq!(patient_id.to_string(), "PO00002");
                    assert_eq!(path, &stale);
                }
                other => panic!("expected an unfinished registration, got {other:?}"),
            }
            assert!(err.to_string().contains(&stale.display().to_string()));
        }

        fs::remove_dir(&stale).unwrap();
        let second = service.create(new_patient("Second")).unwrap();
        assert_eq!(second.patient_id.to_string(), "PO00002");
    }

    #[test]
    fn test_malformed_latest_identifier_surfaces_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let service = PatientService::new(cfg.clone());
        let dir = cfg.patients_dir().join("XY1");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(PatientFile::NAME),
            "record_number: 1\npatient_id: XY1\nname: Legacy\n",
        )
        .unwrap();

        let err = service.next_patient_id().unwrap_err();
        assert!(matches!(err, RecordError::Id(frontdesk_ids::IdError::Format(ref raw)) if raw == "XY1"));
        assert!(matches!(
            service.create(new_patient("Next")),
            Err(RecordError::Id(frontdesk_ids::IdError::Format(_)))
        ));
    }

    #[test]
    fn test_update_keeps_identifier_and_validates() {
        let temp_dir = TempDir::new().unwrap();
        let service = PatientService::new(config_in(&temp_dir));
        let created = service.create(new_patient("Ravi Kumar")).unwrap();

        let mut changes = new_patient("Ravi K. Kumar");
        changes.status = PatientStatus::Chronic;
        let updated = service.update(&created.patient_id, changes).unwrap();

        assert_eq!(updated.patient_id, created.patient_id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(service.get(&created.patient_id).unwrap().status, PatientStatus::Chronic);

        let mut too_old = new_patient("Ravi");
        too_old.age = 151;
        assert!(matches!(
            service.update(&created.patient_id, too_old),
            Err(RecordError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_get_missing_patient_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let service = PatientService::new(config_in(&temp_dir));

        let err = service.get(&PatientId::from_number(9)).unwrap_err();
        assert_eq!(err.to_string(), "patient PO00009 not found");
    }

    #[test]
    fn test_search_is_case_insensitive_sorted_and_capped() {
        let temp_dir = TempDir::new().unwrap();
        let service = PatientService::new(config_in(&temp_dir));
        for name in ["zara khan", "Arjun Mehta", "Tara Singh", "Kamala Devi"] {
            service.create(new_patient(name)).unwrap();
        }
        for i in 0..25 {
            service.create(new_patient(&format!("Bulk {i:02}"))).unwrap();
        }

        let names: Vec<String> = service
            .search("AR")
            .unwrap()
            .iter()
            .map(|p| p.name.to_string())
            .collect();
        assert_eq!(names, vec!["Arjun Mehta", "Tara Singh", "zara khan"]);

        assert_eq!(service.search("").unwrap().len(), SEARCH_RESULT_LIMIT);
        assert_eq!(
            service.search("arjun").unwrap()[0].search_label(),
            "Arjun Mehta (42 yrs, Female)"
        );
    }

    #[test]
    fn test_unparseable_patient_is_skipped_when_listing() {
        let temp_dir = TempDir::new().unwrap();
        let cfg = config_in(&temp_dir);
        let service = PatientService::new(cfg.clone());
        service.create(new_patient("Valid")).unwrap();
        let broken = cfg.patients_dir().join("PO00099");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join(PatientFile::NAME), "not: [valid").unwrap();

        assert_eq!(service.list().unwrap().len(), 1);
    }
}
