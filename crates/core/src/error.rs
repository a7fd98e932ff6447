use documents::RenderError;
use frontdesk_ids::{IdError, PatientId};
use records::RecordsError;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("patient identifier {0} is already taken")]
    DuplicatePatientId(PatientId),
    #[error(
        "patient identifier {patient_id} is held by an unfinished registration; remove {path} if no registration is running",
        path = path.display()
    )]
    UnfinishedRegistration {
        patient_id: PatientId,
        path: std::path::PathBuf,
    },
    #[error("{kind} key {key} is already taken")]
    KeyConflict { kind: &'static str, key: u64 },
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error("failed to render document: {0}")]
    Render(#[from] RenderError),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error(
        "create failed and cleanup also failed (path: {path}): create={create_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterCreateFailed {
        path: std::path::PathBuf,
        #[source]
        create_error: Box<RecordError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to read record directory: {0}")]
    DirRead(std::io::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(String),
}

impl RecordError {
    pub(crate) fn patient_not_found(id: &PatientId) -> Self {
        RecordError::NotFound {
            kind: "patient",
            id: id.to_string(),
        }
    }
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;
