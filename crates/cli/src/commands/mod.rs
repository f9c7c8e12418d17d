pub mod config;
pub mod search;
pub mod validate;

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use varisearch_core::errors::{ApplicationError, InterfaceError};
use varisearch_core::search::catalog::{CatalogParts, CatalogSnapshot};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_SEARCH: u8 = 4;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success_with_data<T: Serialize>(
        command: &str,
        message: impl Into<String>,
        data: Option<T>,
    ) -> Self {
        let data = match data.map(serde_json::to_value).transpose() {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_SEARCH);
            }
        };

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data,
        };
        Self { exit_code: EXIT_OK, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps a core failure onto the interface error class and the exit code
    /// of the layer it came from.
    pub fn application_failure(
        command: &str,
        error: ApplicationError,
        correlation_id: &str,
    ) -> Self {
        let exit_code = match &error {
            ApplicationError::Search(_) => EXIT_SEARCH,
            ApplicationError::Catalog(_) | ApplicationError::Snapshot(_) => EXIT_INPUT,
            ApplicationError::Configuration(_) => EXIT_CONFIG,
        };

        let interface = error.into_interface(correlation_id);
        let error_class = match &interface {
            InterfaceError::BadRequest { .. } => "bad_request",
            InterfaceError::UnprocessableCatalog { .. } => "unprocessable_catalog",
            InterfaceError::Internal { .. } => "internal",
        };

        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({interface})", interface.user_message()),
            correlation_id: Some(interface.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
    what: &str,
) -> Result<T, ApplicationError> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ApplicationError::Snapshot(format!("could not read {what} `{}`: {error}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|error| {
        ApplicationError::Snapshot(format!("could not parse {what} `{}`: {error}", path.display()))
    })
}

/// Unreadable or malformed JSON is an input failure; a document that parses
/// but breaks a catalog invariant surfaces as a catalog error.
pub(crate) fn load_snapshot(path: &Path) -> Result<CatalogSnapshot, ApplicationError> {
    let parts: CatalogParts = read_json(path, "catalog")?;
    Ok(CatalogSnapshot::try_from(parts)?)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
