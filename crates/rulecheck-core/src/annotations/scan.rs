use serde::{Deserialize, Serialize};

use crate::annotations::marker::{LineMarker, MarkerKind, MatchMode, classify_line};

/// A marker accepted for a target rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub kind: MarkerKind,
    /// Zero-based index of the marker line.
    pub line_index: usize,
    pub referenced_id: String,
    /// The marker line without its line terminator.
    pub raw_text: String,
}

/// Scans fixture lines for markers accepted for `target_id`.
///
/// Annotations are returned in file order, at most one per line. An empty
/// result is not an error: it means the fixture carries no usable evidence
/// for this rule.
pub fn scan<S: AsRef<str>>(lines: &[S], target_id: &str, mode: MatchMode) -> Vec<Annotation> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let line = line.as_ref();
            let (kind, referenced_id) = match classify_line(line, target_id, mode) {
                LineMarker::Positive(id) => (MarkerKind::Positive, id),
                LineMarker::Negative(id) => (MarkerKind::Negative, id),
                LineMarker::NoMatch => return None,
            };
            Some(Annotation {
                kind,
                line_index,
                referenced_id: referenced_id.to_string(),
                raw_text: line.trim_end_matches(['\n', '\r']).to_string(),
            })
        })
        .collect()
}
