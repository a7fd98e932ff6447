//! On-disk path definitions for front desk records.
//!
//! This module defines relative filesystem paths inside the record store.
//! It contains **no I/O logic** - only typed path construction.

use crate::constants::VISITS_DIR_NAME;
use frontdesk_ids::PatientId;
use std::path::{Path, PathBuf};

/// Patient YAML filename.
pub struct PatientFile;

impl PatientFile {
    pub const NAME: &'static str = "patient.yaml";

    /// `<patients_dir>/<patient_id>`
    pub fn dir(patients_dir: &Path, patient_id: &PatientId) -> PathBuf {
        patients_dir.join(patient_id.to_string())
    }

    pub fn path(patients_dir: &Path, patient_id: &PatientId) -> PathBuf {
        Self::dir(patients_dir, patient_id).join(Self::NAME)
    }
}

/// Visit YAML files, one per visit, named by visit number.
pub struct VisitFile;

impl VisitFile {
    pub const EXTENSION: &'static str = "yaml";

    pub fn dir(patient_dir: &Path) -> PathBuf {
        patient_dir.join(VISITS_DIR_NAME)
    }

    pub fn file_name(visit_number: u64) -> String {
        format!("{visit_number}.{}", Self::EXTENSION)
    }
}

/// Discharge summary YAML filename.
pub struct DischargeSummaryFile;

impl DischargeSummaryFile {
    pub const NAME: &'static str = "discharge_summary.yaml";

    /// `<discharges_dir>/<id>`
    pub fn dir(discharges_dir: &Path, id: u64) -> PathBuf {
        discharges_dir.join(id.to_string())
    }
}
