use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::annotations::MarkerKind;

/// Splits fixture text into lines that keep their terminators.
///
/// Joining the returned slices reproduces `text` exactly, which is what lets
/// segment text be compared byte-for-byte against the source fixture.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// A contiguous, labeled block of fixture text owned by one annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSegment {
    pub kind: MarkerKind,
    /// Zero-based index of the first line (the marker line).
    pub start_line: usize,
    /// Zero-based, exclusive.
    pub end_line: usize,
    pub text: String,
    pub source_file: PathBuf,
}

impl CodeSegment {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Segments partitioned by polarity, each bucket in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleBuckets {
    pub dangerous: Vec<CodeSegment>,
    pub safe: Vec<CodeSegment>,
}

impl ExampleBuckets {
    pub fn is_empty(&self) -> bool {
        self.dangerous.is_empty() && self.safe.is_empty()
    }

    /// All dangerous segment text concatenated in file order.
    pub fn dangerous_text(&self) -> String {
        concat_text(&self.dangerous)
    }

    /// All safe segment text concatenated in file order.
    pub fn safe_text(&self) -> String {
        concat_text(&self.safe)
    }

    pub fn extend(&mut self, other: ExampleBuckets) {
        self.dangerous.extend(other.dangerous);
        self.safe.extend(other.safe);
    }
}

fn concat_text(segments: &[CodeSegment]) -> String {
    segments.iter().map(|s| s.text.as_str()).collect()
}
