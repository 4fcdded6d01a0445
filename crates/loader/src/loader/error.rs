//! Error types for configuration loading.
//!
//! Responsibilities:
//! - Define error variants for every fatal loading failure, each carrying
//!   enough context (location, path, key) to diagnose without tracing.
//!
//! Does NOT handle:
//! - Recoverable conditions: missing resources, extension-less filenames,
//!   and empty parse results are absorbed by the engine, never surfaced.
//!
//! Invariants:
//! - Dotenv errors never include raw `.env` line contents so secrets cannot
//!   leak into logs or error chains.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A resolvable resource failed to read or parse; aborts the load.
    #[error("failed to load property source from location '{location}'")]
    PropertySource {
        location: String,
        #[source]
        source: Box<LoadError>,
    },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML document in {}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON document in {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing required property '{0}'")]
    MissingProperty(String),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse the `.env` file due to invalid syntax.
    ///
    /// Only the byte index of the failure is reported, never the offending
    /// line content.
    #[error(
        "failed to parse .env file at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env loading"
    )]
    DotenvParse { error_index: usize },

    #[error("failed to read .env file: {kind}")]
    DotenvIo { kind: ErrorKind },

    /// Unknown dotenv error (future variants from the dotenvy crate).
    #[error("failed to load .env file. Hint: set DOTENV_DISABLED=1 to skip .env loading")]
    DotenvUnknown,
}
