//! Batch extraction of labeled examples from a rules corpus.
//!
//! A fixture that yields no evidence, or cannot be read, is skipped on its
//! own. A rule is recorded as skipped only when it cannot be loaded, has no
//! fixtures, or its fixtures hold no `ruleid` evidence for it. Nothing here
//! aborts the walk.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::annotations::MatchMode;
use crate::corpus::discover::{find_fixtures, find_rule_files};
use crate::error::ExtractError;
use crate::pipeline::{extract_examples, read_fixture};
use crate::rules::RuleDocument;
use crate::segments::{CodeSegment, ExampleBuckets};

/// Examples derived for one rule across all of its fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleExamples {
    pub rule_id: String,
    pub language: String,
    pub rule_path: PathBuf,
    /// Fixtures that contributed at least one segment.
    pub fixtures: Vec<PathBuf>,
    pub dangerous: Vec<CodeSegment>,
    pub safe: Vec<CodeSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidRule { detail: String },
    NoFixtures,
    NoAnnotations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRule {
    pub rule_path: PathBuf,
    /// `None` when the document could not be loaded.
    pub rule_id: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorpusStats {
    pub total_rules: usize,
    pub processed_rules: usize,
    /// Segments extracted across all processed rules.
    pub examples: usize,
    pub no_fixtures: usize,
    pub no_annotations: usize,
    pub invalid_rules: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusExtraction {
    pub rules: Vec<RuleExamples>,
    pub skipped: Vec<SkippedRule>,
    pub stats: CorpusStats,
}

impl CorpusExtraction {
    fn skip(&mut self, rule_path: &Path, rule_id: Option<String>, reason: SkipReason) {
        match &reason {
            SkipReason::InvalidRule { .. } => self.stats.invalid_rules += 1,
            SkipReason::NoFixtures => self.stats.no_fixtures += 1,
            SkipReason::NoAnnotations => self.stats.no_annotations += 1,
        }
        info!(rule = %rule_path.display(), ?reason, "rule skipped");
        self.skipped.push(SkippedRule {
            rule_path: rule_path.to_path_buf(),
            rule_id,
            reason,
        });
    }
}

/// Walks `root` and extracts examples for every rule document found.
///
/// Fails only when `root` itself cannot be read.
pub fn extract_corpus(root: &Path, mode: MatchMode) -> Result<CorpusExtraction, ExtractError> {
    std::fs::metadata(root).map_err(|source| ExtractError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let rule_files = find_rule_files(root);
    let mut out = CorpusExtraction {
        stats: CorpusStats {
            total_rules: rule_files.len(),
            ..CorpusStats::default()
        },
        ..CorpusExtraction::default()
    };

    for rule_path in &rule_files {
        let doc = match RuleDocument::load(rule_path) {
            Ok(doc) => doc,
            Err(err) => {
                out.skip(rule_path, None, SkipReason::InvalidRule {
                    detail: err.to_string(),
                });
                continue;
            }
        };
        let rule = match doc.primary() {
            Ok(rule) => rule,
            Err(err) => {
                out.skip(rule_path, None, SkipReason::InvalidRule {
                    detail: err.to_string(),
                });
                continue;
            }
        };

        let fixtures = find_fixtures(rule_path, &rule.languages);
        if fixtures.is_empty() {
            out.skip(rule_path, Some(rule.id.clone()), SkipReason::NoFixtures);
            continue;
        }

        let mut buckets = ExampleBuckets::default();
        let mut contributing = Vec::new();
        for fixture in &fixtures {
            match fixture_examples(fixture, &rule.id, mode) {
                Ok(found) => {
                    buckets.extend(found);
                    contributing.push(fixture.clone());
                }
                Err(err) if err.is_no_evidence() => {
                    debug!(fixture = %fixture.display(), "{err}");
                }
                Err(err) => {
                    warn!(fixture = %fixture.display(), error = %err, "fixture skipped");
                }
            }
        }

        // Safe-only evidence cannot show the rule fires.
        if buckets.dangerous.is_empty() {
            out.skip(rule_path, Some(rule.id.clone()), SkipReason::NoAnnotations);
            continue;
        }

        out.stats.processed_rules += 1;
        out.stats.examples += buckets.dangerous.len() + buckets.safe.len();
        out.rules.push(RuleExamples {
            rule_id: rule.id.clone(),
            language: rule.primary_language().to_string(),
            rule_path: rule_path.clone(),
            fixtures: contributing,
            dangerous: buckets.dangerous,
            safe: buckets.safe,
        });
    }

    info!(
        total = out.stats.total_rules,
        processed = out.stats.processed_rules,
        examples = out.stats.examples,
        "corpus extraction finished"
    );
    Ok(out)
}

fn fixture_examples(
    fixture: &Path,
    rule_id: &str,
    mode: MatchMode,
) -> Result<ExampleBuckets, ExtractError> {
    let text = read_fixture(fixture)?;
    extract_examples(&text, fixture, rule_id, mode)
}
