//! Error types for ontology loading and caching
//!
//! Tree operations (prune, sort, search, selection) are total and never
//! produce these errors. Only the collaborator boundary can fail: reading the
//! raw ontology, reading the domain model, and loading configuration.

use thiserror::Error;

/// Main error type for the ontology tree engine
#[derive(Error, Debug)]
pub enum OntologyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown picker preset '{name}'")]
    UnknownPicker { name: String },

    #[error("Ontology source failed: {message}")]
    Source { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl OntologyError {
    /// Wrap a collaborator failure that has no structured error of its own
    pub fn source_failed(message: impl Into<String>) -> Self {
        OntologyError::Source {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OntologyError>;
