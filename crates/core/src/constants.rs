//! Constants used throughout the front desk core crate.
//!
//! Directory and file names of the record store, and the defaults applied when the
//! environment does not override them.

/// Default directory for record storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "patient_data";

/// Directory holding one sub-directory per patient, named by patient identifier.
pub const PATIENTS_DIR_NAME: &str = "patients";

/// Directory inside a patient directory holding that patient's visits.
pub const VISITS_DIR_NAME: &str = "visits";

/// Directory holding one sub-directory per discharge summary, named by its key.
pub const DISCHARGES_DIR_NAME: &str = "discharges";

pub const DEFAULT_STATIC_URL: &str = "/static/";
pub const DEFAULT_MEDIA_URL: &str = "/media/";

/// Base URL used for resource fallback when no request host is known.
pub const DEFAULT_PUBLIC_URL: &str = "http://127.0.0.1:3000/";

/// Maximum number of results returned by a patient name search.
pub const SEARCH_RESULT_LIMIT: usize = 20;

/// Number of most recently registered patients shown in the visit history.
pub const VISIT_HISTORY_PATIENTS: usize = 2;

pub const MAX_AGE: u16 = 150;

/// Maximum length of a blood pressure reading such as `120/80 mmHg`.
pub const BLOOD_PRESSURE_MAX_LEN: usize = 15;

pub const NAME_MAX_LEN: usize = 100;
pub const CONTACT_NUMBER_MAX_LEN: usize = 15;
