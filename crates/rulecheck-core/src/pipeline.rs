//! End-to-end validation of a rule against an annotated fixture.
//!
//! Scan -> Segment -> bucket -> validate_pair -> decide. Every stage except
//! the engine call is a pure function of its inputs.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::annotations::{Annotation, MatchMode, scan};
use crate::engine::{Engine, ValidationResult, ValidationSample, validate_pair};
use crate::error::ExtractError;
use crate::rules::RuleDefinition;
use crate::segments::{CodeSegment, ExampleBuckets, bucket, segment, split_lines};
use crate::verdict::{Verdict, decide};

/// Annotations and segments found in one fixture for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureScan {
    pub rule_id: String,
    pub fixture: PathBuf,
    pub annotations: Vec<Annotation>,
    pub segments: Vec<CodeSegment>,
}

/// Engine results for a positive/negative pair and the verdict over them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairValidation {
    pub positive_sample: ValidationSample,
    pub negative_sample: ValidationSample,
    pub positive: ValidationResult,
    pub negative: ValidationResult,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureValidation {
    pub rule_id: String,
    pub fixture: PathBuf,
    pub buckets: ExampleBuckets,
    pub pair: PairValidation,
}

impl FixtureValidation {
    pub fn passed(&self) -> bool {
        self.pair.verdict.passed()
    }
}

/// Reads a fixture, replacing invalid UTF-8 rather than failing on it.
pub fn read_fixture(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Scans and segments fixture `text` for `rule_id`.
///
/// Fails with a "no evidence" signal when nothing in the text is
/// annotated for the rule.
pub fn scan_fixture(
    text: &str,
    fixture: &Path,
    rule_id: &str,
    mode: MatchMode,
) -> Result<FixtureScan, ExtractError> {
    let lines = split_lines(text);
    let annotations = scan(&lines, rule_id, mode);
    if annotations.is_empty() {
        return Err(ExtractError::NoAnnotationsFound {
            rule_id: rule_id.to_string(),
            fixture: fixture.to_path_buf(),
        });
    }

    let segments = segment(&lines, &annotations, fixture);
    if segments.is_empty() {
        return Err(ExtractError::EmptySegmentation {
            rule_id: rule_id.to_string(),
            fixture: fixture.to_path_buf(),
        });
    }

    debug!(
        rule_id,
        fixture = %fixture.display(),
        annotations = annotations.len(),
        "fixture scanned"
    );
    Ok(FixtureScan {
        rule_id: rule_id.to_string(),
        fixture: fixture.to_path_buf(),
        annotations,
        segments,
    })
}

/// Labeled examples for `rule_id` from fixture `text`, bucketed by polarity.
pub fn extract_examples(
    text: &str,
    fixture: &Path,
    rule_id: &str,
    mode: MatchMode,
) -> Result<ExampleBuckets, ExtractError> {
    Ok(bucket(scan_fixture(text, fixture, rule_id, mode)?.segments))
}

/// Validates `rule` against explicit positive and negative source text.
pub fn validate_texts(
    engine: &dyn Engine,
    rule: &RuleDefinition,
    positive_text: impl Into<String>,
    negative_text: impl Into<String>,
) -> PairValidation {
    let language = rule.primary_language();
    let positive_sample = ValidationSample::new(positive_text, language);
    let negative_sample = ValidationSample::new(negative_text, language);

    let (positive, negative) = validate_pair(engine, rule, &positive_sample, &negative_sample);
    let verdict = decide(&positive, &negative);

    PairValidation {
        positive_sample,
        negative_sample,
        positive,
        negative,
        verdict,
    }
}

/// Runs the full pipeline for one rule and one fixture file.
///
/// Each bucket is submitted as one sample: its segments concatenated in
/// file order. An empty bucket is still submitted, as empty text, so a
/// fixture without dangerous examples can never pass.
pub fn validate_fixture(
    engine: &dyn Engine,
    rule: &RuleDefinition,
    fixture: &Path,
    mode: MatchMode,
) -> Result<FixtureValidation, ExtractError> {
    let text = read_fixture(fixture)?;
    let buckets = extract_examples(&text, fixture, &rule.id, mode)?;

    let pair = validate_texts(engine, rule, buckets.dangerous_text(), buckets.safe_text());
    info!(
        rule_id = %rule.id,
        fixture = %fixture.display(),
        passed = pair.verdict.passed(),
        "fixture validated"
    );

    Ok(FixtureValidation {
        rule_id: rule.id.clone(),
        fixture: fixture.to_path_buf(),
        buckets,
        pair,
    })
}
