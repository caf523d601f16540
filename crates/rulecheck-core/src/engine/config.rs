use std::time::Duration;

/// Program invoked when none is configured.
pub const DEFAULT_ENGINE_PROGRAM: &str = "semgrep";

/// Wall-clock budget for one engine call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the external analysis engine is located and invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Program name resolved on `PATH`, or an explicit path.
    pub program: String,
    pub timeout: Duration,
    /// Inserted after `--json` and before the sample path.
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_ENGINE_PROGRAM.to_string(),
            timeout: DEFAULT_TIMEOUT,
            extra_args: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
