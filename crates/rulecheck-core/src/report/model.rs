use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::SCHEMA_VERSION;
use crate::annotations::{Annotation, MatchMode};
use crate::corpus::{CorpusExtraction, CorpusStats, RuleExamples, SkippedRule};
use crate::engine::{CliEngine, ValidationResult};
use crate::pipeline::{FixtureScan, PairValidation};
use crate::rules::RuleDefinition;
use crate::segments::{CodeSegment, ExampleBuckets};
use crate::verdict::Verdict;

/// Exit code for a passing validation.
pub const EXIT_PASSED: i32 = 0;
/// Exit code for a failing validation, including engine failures.
pub const EXIT_FAILED: i32 = 1;
/// Exit code when a fixture carries no annotations for the rule.
pub const EXIT_NO_EVIDENCE: i32 = 3;

/// Tool metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

/// Content fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactHash {
    pub algorithm: String,
    pub value: String,
}

impl ArtifactHash {
    pub fn sha256(bytes: &[u8]) -> Self {
        Self {
            algorithm: "sha256".to_string(),
            value: hex::encode(Sha256::digest(bytes)),
        }
    }
}

/// The rule under validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleInfo {
    pub id: String,
    pub language: String,
    pub severity: String,
    pub path: Option<PathBuf>,
    /// Fingerprint of the single-rule document submitted to the engine.
    pub hash: ArtifactHash,
}

impl RuleInfo {
    pub fn new(rule: &RuleDefinition, path: Option<&Path>) -> Result<Self, serde_yaml::Error> {
        let submitted = rule.to_engine_yaml()?;
        Ok(Self {
            id: rule.id.clone(),
            language: rule.primary_language().to_string(),
            severity: rule.severity.clone(),
            path: path.map(Path::to_path_buf),
            hash: ArtifactHash::sha256(submitted.as_bytes()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureInfo {
    pub path: PathBuf,
    pub dangerous_segments: usize,
    pub safe_segments: usize,
}

impl FixtureInfo {
    pub fn new(path: &Path, buckets: &ExampleBuckets) -> Self {
        Self {
            path: path.to_path_buf(),
            dangerous_segments: buckets.dangerous.len(),
            safe_segments: buckets.safe.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    pub program: String,
    /// Where the program was found; `None` if it was not.
    pub resolved: Option<PathBuf>,
    pub timeout_ms: u64,
    pub extra_args: Vec<String>,
}

impl EngineInfo {
    pub fn new(engine: &CliEngine) -> Self {
        let config = engine.config();
        Self {
            program: config.program.clone(),
            resolved: engine.program().map(Path::to_path_buf),
            timeout_ms: config.timeout.as_millis() as u64,
            extra_args: config.extra_args.clone(),
        }
    }
}

/// One side of a validation: what was submitted and what came back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleReport {
    pub language: String,
    pub sample_bytes: usize,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValidationStatus::Passed => "PASSED",
            ValidationStatus::Failed => "FAILED",
        })
    }
}

/// Top-level report for `validate` and `check`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub rule: RuleInfo,
    /// Absent when the samples were given directly rather than extracted.
    pub fixture: Option<FixtureInfo>,
    pub engine: EngineInfo,
    pub positive: SampleReport,
    pub negative: SampleReport,
    pub verdict: Verdict,
    pub status: ValidationStatus,
    pub exit_code: i32,
}

impl ValidationReport {
    pub fn new(
        tool: ToolInfo,
        rule: RuleInfo,
        fixture: Option<FixtureInfo>,
        engine: EngineInfo,
        pair: PairValidation,
    ) -> Self {
        let (status, exit_code) = if pair.verdict.passed() {
            (ValidationStatus::Passed, EXIT_PASSED)
        } else {
            (ValidationStatus::Failed, EXIT_FAILED)
        };

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            rule,
            fixture,
            engine,
            positive: SampleReport {
                language: pair.positive_sample.language,
                sample_bytes: pair.positive_sample.text.len(),
                result: pair.positive,
            },
            negative: SampleReport {
                language: pair.negative_sample.language,
                sample_bytes: pair.negative_sample.text.len(),
                result: pair.negative,
            },
            verdict: pair.verdict,
            status,
            exit_code,
        }
    }
}

/// Report for `scan`: what the scanner and segmenter found in one fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub rule_id: String,
    pub match_mode: MatchMode,
    pub fixture: PathBuf,
    /// SHA-256 of the fixture text as scanned.
    pub fixture_hash: ArtifactHash,
    pub annotations: Vec<Annotation>,
    pub segments: Vec<CodeSegment>,
}

impl ScanReport {
    pub fn new(tool: ToolInfo, mode: MatchMode, text: &str, scan: FixtureScan) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            rule_id: scan.rule_id,
            match_mode: mode,
            fixture: scan.fixture,
            fixture_hash: ArtifactHash::sha256(text.as_bytes()),
            annotations: scan.annotations,
            segments: scan.segments,
        }
    }
}

/// Report for `extract`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub root: PathBuf,
    pub match_mode: MatchMode,
    pub stats: CorpusStats,
    pub rules: Vec<RuleExamples>,
    pub skipped: Vec<SkippedRule>,
}

impl CorpusReport {
    pub fn new(tool: ToolInfo, root: &Path, mode: MatchMode, extraction: CorpusExtraction) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            root: root.to_path_buf(),
            match_mode: mode,
            stats: extraction.stats,
            rules: extraction.rules,
            skipped: extraction.skipped,
        }
    }
}

/// Report for `doctor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorReport {
    pub schema_version: String,
    pub tool: ToolInfo,
    pub engine: EngineInfo,
    pub available: bool,
    pub version: Option<String>,
}

impl DoctorReport {
    pub fn new(tool: ToolInfo, engine: &CliEngine, version: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tool,
            engine: EngineInfo::new(engine),
            available: engine.is_available(),
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, FailureCode, Match, ValidationSample};
    use crate::rules::RuleDocument;
    use crate::verdict::decide;

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "rulecheck".into(),
            version: "0.1.0-test".into(),
        }
    }

    fn rule() -> RuleDefinition {
        RuleDocument::from_yaml_str(
            "rules:\n  - id: r\n    message: m\n    languages: [go]\n    severity: ERROR\n    pattern: exec.Command(...)\n",
        )
        .unwrap()
        .rules
        .remove(0)
    }

    fn pair(positive: ValidationResult, negative: ValidationResult) -> PairValidation {
        let verdict = decide(&positive, &negative);
        PairValidation {
            positive_sample: ValidationSample::new("exec.Command(x)\n", "go"),
            negative_sample: ValidationSample::new("", "go"),
            positive,
            negative,
            verdict,
        }
    }

    fn engine_info() -> EngineInfo {
        EngineInfo::new(&CliEngine::new(
            EngineConfig::default().with_program("rulecheck-engine-that-is-not-installed"),
        ))
    }

    #[test]
    fn sha256_is_hex_encoded() {
        let hash = ArtifactHash::sha256(b"rulecheck");
        assert_eq!(hash.algorithm, "sha256");
        assert_eq!(hash.value.len(), 64);
        assert!(hash.value.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, ArtifactHash::sha256(b"rulecheck"));
        assert_ne!(hash, ArtifactHash::sha256(b"rulecheck\n"));
    }

    #[test]
    fn passing_pair_maps_to_exit_zero() {
        let hit = ValidationResult::completed(
            vec![Match {
                message: "m".into(),
                location: serde_json::Value::Null,
            }],
            vec![],
        );
        let report = ValidationReport::new(
            tool(),
            RuleInfo::new(&rule(), None).unwrap(),
            None,
            engine_info(),
            pair(hit, ValidationResult::completed(vec![], vec![])),
        );

        assert_eq!(report.status, ValidationStatus::Passed);
        assert_eq!(report.exit_code, EXIT_PASSED);
        assert_eq!(report.positive.sample_bytes, "exec.Command(x)\n".len());
        assert_eq!(report.rule.language, "go");
    }

    #[test]
    fn failed_engine_maps_to_exit_one_and_serializes_code() {
        let down = || ValidationResult::failed(FailureCode::EngineUnavailable, None);
        let report = ValidationReport::new(
            tool(),
            RuleInfo::new(&rule(), None).unwrap(),
            None,
            engine_info(),
            pair(down(), down()),
        );

        assert_eq!(report.exit_code, EXIT_FAILED);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["positive"]["result"]["failure"], "ENGINE_UNAVAILABLE");
        assert_eq!(json["verdict"]["passed"], false);
        assert!(json["engine"]["resolved"].is_null());
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn rule_hash_tracks_submitted_document() {
        let a = RuleInfo::new(&rule(), None).unwrap();
        let mut changed = rule();
        changed.severity = "INFO".into();
        let b = RuleInfo::new(&changed, None).unwrap();
        assert_ne!(a.hash, b.hash);
    }
}
