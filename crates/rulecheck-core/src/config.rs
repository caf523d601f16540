//! Tool configuration file (`rulecheck.toml`).
//!
//! ```toml
//! [engine]
//! program = "semgrep"
//! timeout_secs = 30
//! extra_args = ["--metrics=off"]
//!
//! [scan]
//! match_mode = "exact"
//! ```
//!
//! Every key is optional. CLI flags override whatever is loaded here.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::annotations::MatchMode;
use crate::engine::{DEFAULT_ENGINE_PROGRAM, DEFAULT_TIMEOUT, EngineConfig};
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    pub engine: EngineSection,
    pub scan: ScanSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub program: String,
    pub timeout_secs: u64,
    pub extra_args: Vec<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            program: DEFAULT_ENGINE_PROGRAM.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub match_mode: MatchMode,
}

impl ToolConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Engine settings, with the timeout checked.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        engine_config(
            &self.engine.program,
            self.engine.timeout_secs,
            &self.engine.extra_args,
        )
    }
}

/// Builds an `EngineConfig`, rejecting a zero timeout.
pub fn engine_config(
    program: &str,
    timeout_secs: u64,
    extra_args: &[String],
) -> Result<EngineConfig, ConfigError> {
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }
    Ok(EngineConfig {
        program: program.to_string(),
        timeout: Duration::from_secs(timeout_secs),
        extra_args: extra_args.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = ToolConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, ToolConfig::default());
        assert_eq!(cfg.scan.match_mode, MatchMode::SubstringCompat);
        assert_eq!(cfg.engine_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn reads_engine_and_scan_sections() {
        let cfg = ToolConfig::from_toml_str(
            r#"
[engine]
program = "/opt/semgrep/bin/semgrep"
timeout_secs = 5
extra_args = ["--metrics=off"]

[scan]
match_mode = "exact"
"#,
        )
        .unwrap();

        let engine = cfg.engine_config().unwrap();
        assert_eq!(engine.program, "/opt/semgrep/bin/semgrep");
        assert_eq!(engine.timeout, Duration::from_secs(5));
        assert_eq!(engine.extra_args, vec!["--metrics=off".to_string()]);
        assert_eq!(cfg.scan.match_mode, MatchMode::Exact);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = ToolConfig::from_toml_str("[engine]\ntimeout_secs = 2\n").unwrap();
        assert_eq!(cfg.engine.program, DEFAULT_ENGINE_PROGRAM);
        assert_eq!(cfg.engine.timeout_secs, 2);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = ToolConfig::from_toml_str("[engine]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(cfg.engine_config(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn unknown_keys_and_bad_modes_are_errors() {
        assert!(matches!(
            ToolConfig::from_toml_str("[engine]\nprogramme = \"x\"\n"),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            ToolConfig::from_toml_str("[scan]\nmatch_mode = \"fuzzy\"\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ToolConfig::load_from(Path::new("/nonexistent/rulecheck.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rulecheck.toml"));
    }
}
