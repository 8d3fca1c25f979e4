use std::path::PathBuf;

use thiserror::Error;

use crate::types::Kind;

/// Boxed error returned by text and binary decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum DotfigError {
    #[error("Configuration target must be a record, got {type_name}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(help("implement `Record` for the target with the `record!` macro"))
    )]
    NotARecord { type_name: &'static str },

    #[error("Could not resolve '{name}': {source}")]
    Resolve { name: String, source: ResolveError },

    #[error("Could not assign the value of '{key}' to '{name}': {source}")]
    Assign {
        key: String,
        name: String,
        source: AssignError,
    },

    #[error("Could not set '{name}': {source}")]
    Override { name: String, source: AssignError },

    #[error("Environment variable '{key}' is not valid unicode")]
    NonUnicodeEnv { key: String },

    #[error("Missing configuration file {path}: {source}")]
    MissingFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Parse { path: PathBuf, source: DecodeError },

    #[error("Failed to decode configuration data: {source}")]
    Data { source: DecodeError },

    #[error("Unknown keys in {origin}: {}", keys.join(", "))]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(help("remove the keys or disable strict mode with `.strict(false)`"))
    )]
    UnknownKeys { origin: String, keys: Vec<String> },

    #[error("'{name}' is missing")]
    Missing { name: String },

    #[error("'{name}' is empty")]
    Empty { name: String },
}

/// Failure to walk a dotted path down to a field.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("empty field path")]
    EmptyPath,

    #[error("cannot get field '{segment}' from a {kind} value")]
    NotAStruct { segment: String, kind: Kind },

    #[error("'{container}' doesn't have a field '{segment}'")]
    UnknownField {
        container: &'static str,
        segment: String,
    },

    #[error("optional of optional (as in '{segment}' being a {type_name}) is unsupported")]
    DoubleIndirection {
        segment: String,
        type_name: &'static str,
    },
}

/// Failure to convert a raw string into a resolved field.
#[derive(Debug, Error)]
pub enum AssignError {
    #[error("cannot set the value of a hidden field")]
    NotSettable,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to decode binary value: {source}")]
    Binary { source: BoxError },

    #[error("failed to decode text value: {source}")]
    Text { source: BoxError },

    #[error("failed to decode value as JSON: {source}")]
    Structured { source: serde_json::Error },
}

/// Failure to turn raw bytes into a document, or a document into a record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "yaml")]
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("document does not match the target: {0}")]
    Mismatch(serde_json::Error),

    #[error(transparent)]
    Custom(BoxError),
}
