//! Shared YAML parse/render helpers.

use crate::{RecordsError, RecordsResult};
use serde::{de::DeserializeOwned, Serialize};

/// Parses YAML into `T`, reporting the path to the first mismatching field.
///
/// `kind` names the resource in the error message (for example `Patient`).
pub(crate) fn parse<T: DeserializeOwned>(kind: &str, yaml_text: &str) -> RecordsResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        RecordsError::Translation(format!("{kind} schema mismatch at {path}: {source}"))
    })
}

pub(crate) fn render<T: Serialize>(value: &T) -> RecordsResult<String> {
    Ok(serde_yaml::to_string(value)?)
}
