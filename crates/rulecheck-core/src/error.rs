//! Error types for the library boundaries.
//!
//! Engine invocation failures are deliberately absent here: they are
//! reported as values through `engine::ValidationResult` so the verdict
//! stage can always produce a well-formed outcome.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or validating a rule definition document.
#[derive(Debug, Error)]
pub enum RuleLoadError {
    #[error("failed to read rule document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rule document is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("rule document contains no rules")]
    NoRules,

    #[error("rule at index {index} has an empty id")]
    MissingId { index: usize },

    #[error("rule `{id}` declares no pattern field")]
    MissingPatterns { id: String },

    #[error("rule `{id}` is not defined in the document")]
    UnknownRule { id: String },
}

/// Signals raised while deriving labeled examples from one fixture.
///
/// `NoAnnotationsFound` and `EmptySegmentation` are not faults: they tell a
/// batch caller to skip the fixture and record why.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no annotations for `{rule_id}` in {fixture}")]
    NoAnnotationsFound { rule_id: String, fixture: PathBuf },

    #[error("annotations for `{rule_id}` in {fixture} produced no segments")]
    EmptySegmentation { rule_id: String, fixture: PathBuf },

    #[error("failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    /// True for the "no usable evidence" signals, false for real I/O faults.
    pub fn is_no_evidence(&self) -> bool {
        matches!(
            self,
            ExtractError::NoAnnotationsFound { .. } | ExtractError::EmptySegmentation { .. }
        )
    }
}

/// Failures while loading tool configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("engine timeout must be greater than zero")]
    InvalidTimeout,
}

/// Reasons engine standard output could not be interpreted.
#[derive(Debug, Error)]
pub enum MalformedOutput {
    #[error("engine output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("engine output is not a JSON object")]
    NotAnObject,

    #[error("engine output field `{0}` is not an array")]
    NotAnArray(&'static str),
}
