//! Discharge summaries and their PDF export.
//!
//! Each summary is stored in its own directory keyed by a sequential number:
//!
//! ```text
//! discharges/
//!   1/
//!     discharge_summary.yaml
//!   2/
//!     discharge_summary.yaml
//! ```
//!
//! Summaries are immutable once written. The PDF export is recomputed on every request and
//! never stored.

use crate::config::CoreConfig;
use crate::error::{RecordError, RecordResult};
use crate::paths::DischargeSummaryFile;
use crate::repositories::patients::PatientService;
use crate::repositories::shared::{
    fill_or_remove, load_all, next_numeric_key, numeric_key, read_dir_paths, read_record_file,
    try_create_dir, try_create_file,
};
use crate::validation::{optional_text, required_text, validate_stay};
use chrono::{NaiveDate, Utc};
use documents::RenderedDocument;
use frontdesk_ids::PatientId;
use records::{DischargeSummaryRecord, DischargeSummaryYaml, DischargeType};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Fields supplied when writing a discharge summary.
///
/// Also the schema of the YAML files accepted by the command line `add-discharge` command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewDischargeSummary {
    pub patient_id: Option<PatientId>,
    pub uhid: String,
    #[serde(default)]
    pub ip_id: Option<String>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub bed_no: Option<String>,
    pub consultant_name: String,
    pub admission_date: Option<NaiveDate>,
    pub discharge_date: Option<NaiveDate>,
    #[serde(default)]
    pub discharge_type: DischargeType,
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

impl NewDischargeSummary {
    /// Parses a summary draft from YAML, naming the failing field on schema errors.
    pub fn from_yaml(yaml_text: &str) -> RecordResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        serde_path_to_error::deserialize(deserializer).map_err(|err| {
            let path = err.path().to_string();
            RecordError::YamlDeserialization(format!(
                "discharge summary schema mismatch at {path}: {}",
                err.into_inner()
            ))
        })
    }
}

fn required<T>(field: &str, value: Option<T>) -> RecordResult<T> {
    value.ok_or_else(|| RecordError::InvalidInput(format!("{field} is required")))
}

/// Writes the record into its claimed directory without replacing an existing file.
fn write_summary_file(summary_dir: &Path, record: &DischargeSummaryRecord) -> RecordResult<()> {
    let yaml = DischargeSummaryYaml::render(record)?;
    if !try_create_file(&summary_dir.join(DischargeSummaryFile::NAME), &yaml)? {
        return Err(RecordError::KeyConflict {
            kind: "discharge summary",
            key: record.id,
        });
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct DischargeService {
    cfg: Arc<CoreConfig>,
    patients: PatientService,
}

impl DischargeService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let patients = PatientService::new(cfg.clone());
        Self { cfg, patients }
    }

    /// Validates and stores a new discharge summary.
    ///
    /// # Errors
    ///
    /// - `RecordError::InvalidInput` for a missing required field or a discharge dated before
    ///   the admission
    /// - `RecordError::NotFound` if the patient does not exist
    /// - `RecordError::KeyConflict` if another writer took the key first
    pub fn create(&self, new: NewDischargeSummary) -> RecordResult<DischargeSummaryRecord> {
        let patient_id = required("patient_id", new.patient_id)?;
        let uhid = required_text("uhid", &new.uhid)?;
        let consultant_name = required_text("consultant_name", &new.consultant_name)?;
        let final_diagnosis = required_text("final_diagnosis", &new.final_diagnosis)?;
        let admission_date = required("admission_date", new.admission_date)?;
        let discharge_date = required("discharge_date", new.discharge_date)?;
        validate_stay(admission_date, discharge_date)?;

        if !self.patients.exists(&patient_id) {
            return Err(RecordError::patient_not_found(&patient_id));
        }

        let discharges_dir = self.cfg.discharges_dir();
        let id = next_numeric_key(&discharges_dir, None)?;
        let summary_dir = DischargeSummaryFile::dir(&discharges_dir, id);
        if !try_create_dir(&summary_dir)? {
            return Err(RecordError::KeyConflict {
                kind: "discharge summary",
                key: id,
            });
        }

        let record = DischargeSummaryRecord {
            id,
            patient_id,
            uhid,
            ip_id: optional_text(new.ip_id),
            ward: optional_text(new.ward),
            bed_no: optional_text(new.bed_no),
            consultant_name,
            admission_date,
            discharge_date,
            discharge_type: new.discharge_type,
            final_diagnosis,
            procedures_done: optional_text(new.procedures_done),
            clinical_examination: optional_text(new.clinical_examination),
            consultations: optional_text(new.consultations),
            chief_complaints: optional_text(new.chief_complaints),
            past_history: optional_text(new.past_history),
            hospital_course: optional_text(new.hospital_course),
            condition_on_discharge: optional_text(new.condition_on_discharge),
            discharge_advice: optional_text(new.discharge_advice),
            diet_advice: optional_text(new.diet_advice),
            follow_up: optional_text(new.follow_up),
            emergency_instructions: optional_text(new.emergency_instructions),
            created_at: Utc::now(),
        };

        fill_or_remove(&summary_dir, || write_summary_file(&summary_dir, &record))?;

        tracing::info!(summary_id = id, %patient_id, "stored discharge summary");
        Ok(record)
    }

    /// All readable summaries, newest discharge date first.
    pub fn list(&self) -> RecordResult<Vec<DischargeSummaryRecord>> {
        let files = read_dir_paths(&self.cfg.discharges_dir())?
            .into_iter()
            .filter(|dir| numeric_key(dir, None).is_some())
            .map(|dir| dir.join(DischargeSummaryFile::NAME))
            .filter(|path| path.is_file());

        let mut summaries = load_all(files, DischargeSummaryYaml::parse);
        summaries.sort_by(|a, b| {
            b.discharge_date
                .cmp(&a.discharge_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(summaries)
    }

    pub fn get(&self, id: u64) -> RecordResult<DischargeSummaryRecord> {
        let path = DischargeSummaryFile::dir(&self.cfg.discharges_dir(), id)
            .join(DischargeSummaryFile::NAME);
        let content = read_record_file(&path, || RecordError::NotFound {
            kind: "discharge summary",
            id: id.to_string(),
        })?;
        Ok(DischargeSummaryYaml::parse(&content)?)
    }

    /// Renders a stored summary to PDF.
    ///
    /// `base_url` is the URL of the current request, used for resources that are not found
    /// on disk. Without it the configured public URL is used.
    pub fn render_pdf(&self, id: u64, base_url: Option<Url>) -> RecordResult<RenderedDocument> {
        let summary = self.get(id)?;
        let patient = self.patients.get(&summary.patient_id)?;
        let resolver = self.cfg.resolver(base_url);

        match documents::render_discharge_pdf(&patient, &summary, &resolver) {
            Ok(document) => Ok(document),
            Err(err) => {
                tracing::error!(summary_id = id, "PDF rendering failed: {err}");
                Err(err.into())
            }
        }
    }
}
