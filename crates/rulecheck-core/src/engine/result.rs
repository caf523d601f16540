use serde::{Deserialize, Serialize};

/// Source text submitted to the engine, with its declared language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSample {
    pub text: String,
    pub language: String,
}

impl ValidationSample {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }
}

/// Why an engine call did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCode {
    /// Engine program is not resolvable; no process was started.
    EngineUnavailable,
    /// Wall-clock budget exceeded; the process was killed.
    EngineTimeout,
    /// Exit status zero but stdout is not the expected JSON object.
    MalformedEngineOutput,
    /// Non-zero exit with engine errors and no results.
    EngineReportedErrors,
    /// Any other non-zero exit.
    EngineExitStatus,
    /// Temporary artifacts could not be written, or the process could not
    /// be spawned or awaited.
    ArtifactIo,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCode::EngineUnavailable => "ENGINE_UNAVAILABLE",
            FailureCode::EngineTimeout => "ENGINE_TIMEOUT",
            FailureCode::MalformedEngineOutput => "MALFORMED_ENGINE_OUTPUT",
            FailureCode::EngineReportedErrors => "ENGINE_REPORTED_ERRORS",
            FailureCode::EngineExitStatus => "ENGINE_EXIT_STATUS",
            FailureCode::ArtifactIo => "ARTIFACT_IO",
        }
    }
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub message: String,
    /// Engine-specific position data, kept verbatim.
    #[serde(default)]
    pub location: serde_json::Value,
}

/// An error the engine reported about its own run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineError {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    /// The full error object as emitted.
    #[serde(default)]
    pub detail: serde_json::Value,
}

/// Uniform outcome of one engine call.
///
/// `success == false` means the call itself could not be completed or
/// interpreted; zero matches on a completed call is still a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub matches: Vec<Match>,
    pub errors: Vec<EngineError>,
    /// Diagnostic text: stdout for malformed output, stderr for failed exits.
    pub raw: Option<String>,
    pub failure: Option<FailureCode>,
    pub timed_out: bool,
    pub exit_code: Option<i32>,
}

impl ValidationResult {
    pub fn completed(matches: Vec<Match>, errors: Vec<EngineError>) -> Self {
        Self {
            success: true,
            matches,
            errors,
            raw: None,
            failure: None,
            timed_out: false,
            exit_code: Some(0),
        }
    }

    /// A failed call. Failed results never carry matches.
    pub fn failed(code: FailureCode, raw: Option<String>) -> Self {
        Self {
            success: false,
            matches: Vec::new(),
            errors: Vec::new(),
            raw,
            failure: Some(code),
            timed_out: code == FailureCode::EngineTimeout,
            exit_code: None,
        }
    }

    pub fn with_errors(mut self, errors: Vec<EngineError>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_exit_code(mut self, exit_code: Option<i32>) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    /// The engine ran but flagged internal errors. On its own this does
    /// not make the call a failure.
    pub fn has_engine_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
