//! Error types
//!
//! Every failure of a machine type read is terminal for that read. The
//! variants separate input problems (nothing was sent to the API) from
//! lookup and projection failures.

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("project: required field is not set. Set it on the data source or configure a default project")]
    MissingProject,

    #[error(
        "Please specify zone to get appropriate machine types for zone. \
         Unable to get zone: machine types are zone-scoped, set zone on the data source or configure a default zone"
    )]
    MissingZone,

    #[error("Please specify machine_type to get machine type details")]
    MissingMachineType,

    #[error("{kind} {name} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Error setting {field}: {reason}")]
    Field { field: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True when the API reported that the requested resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// True for errors raised before any request was sent
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::MissingProject | Error::MissingZone | Error::MissingMachineType
        )
    }
}
