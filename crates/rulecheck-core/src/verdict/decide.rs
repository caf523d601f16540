use serde::Serialize;

use crate::engine::ValidationResult;

/// Match messages reported per side. Display only; never affects `passed`.
pub const MAX_MATCH_MESSAGES: usize = 3;

/// Longest slice of raw engine text quoted in a diagnostic line.
const MAX_RAW_CHARS: usize = 200;

/// Outcome of validating one rule against a positive and a negative sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    passed: bool,
    positive_detected: bool,
    negative_detected: bool,
    diagnostics: Vec<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn positive_detected(&self) -> bool {
        self.positive_detected
    }

    /// A detection on the safe sample; always implies `!passed()`.
    pub fn negative_detected(&self) -> bool {
        self.negative_detected
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

/// Combines the two engine results into a verdict.
///
/// Argument order matters: `positive` must match, `negative` must not.
pub fn decide(positive: &ValidationResult, negative: &ValidationResult) -> Verdict {
    let positive_detected = positive.has_matches();
    let negative_detected = negative.has_matches();
    let passed = positive.success && negative.success && positive_detected && !negative_detected;

    let mut diagnostics = Vec::new();
    push_call_diagnostics(&mut diagnostics, "positive", positive);
    push_call_diagnostics(&mut diagnostics, "negative", negative);
    push_match_messages(&mut diagnostics, "positive", positive);
    push_match_messages(&mut diagnostics, "negative", negative);

    Verdict {
        passed,
        positive_detected,
        negative_detected,
        diagnostics,
    }
}

fn push_call_diagnostics(out: &mut Vec<String>, side: &str, result: &ValidationResult) {
    if !result.success {
        let code = result
            .failure
            .map(|c| c.as_str())
            .unwrap_or("UNKNOWN_FAILURE");
        match result.raw.as_deref().map(excerpt).filter(|s| !s.is_empty()) {
            Some(raw) => out.push(format!("{side}: engine call failed [{code}]: {raw}")),
            None => out.push(format!("{side}: engine call failed [{code}]")),
        }
    }
    for error in &result.errors {
        out.push(format!("{side}: engine error: {}", error.message));
    }
}

fn push_match_messages(out: &mut Vec<String>, side: &str, result: &ValidationResult) {
    for m in result.matches.iter().take(MAX_MATCH_MESSAGES) {
        out.push(format!("{side} match: {}", m.message));
    }
}

/// First line of `raw`, clipped on a char boundary.
fn excerpt(raw: &str) -> String {
    let line = raw.trim().lines().next().unwrap_or_default();
    match line.char_indices().nth(MAX_RAW_CHARS) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
