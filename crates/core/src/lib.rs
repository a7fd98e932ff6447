//! # Front Desk Core
//!
//! Core business logic for the hospital front desk.
//!
//! This crate contains pure data operations and file/folder management:
//! - Patient registration with sequential `PO#####` identifiers
//! - Visit logging per patient
//! - Discharge summaries and their PDF export
//!
//! Records are YAML files under the configured data directory (see [`config::CoreConfig`]).
//!
//! **No API concerns**: authentication, roles and HTTP servers belong in `api-shared` and
//! `api-rest`.

pub mod config;
pub mod constants;
pub mod error;
pub mod paths;
pub mod repositories;
pub mod validation;

pub use config::{asset_paths_from_env_values, font_file_from_env_value, CoreConfig};
pub use error::{RecordError, RecordResult};
pub use repositories::discharges::{DischargeService, NewDischargeSummary};
pub use repositories::patients::{NewPatient, PatientService};
pub use repositories::visits::{NewVisit, VisitHistoryEntry, VisitService};

pub use documents::{AssetPaths, RenderedDocument, ResourceLocation};
pub use frontdesk_ids::{IdError, PatientId};
pub use frontdesk_types::NonEmptyText;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::constants::DEFAULT_PUBLIC_URL;
    use crate::{AssetPaths, CoreConfig};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Config storing records under `<temp>/data` with assets under `<temp>`.
    pub fn config_in(temp_dir: &TempDir) -> Arc<CoreConfig> {
        let assets = AssetPaths::under_base(temp_dir.path().to_path_buf());
        let cfg = CoreConfig::new(temp_dir.path().join("data"), assets, DEFAULT_PUBLIC_URL)
            .expect("test config should be valid");
        Arc::new(cfg)
    }
}
