//! Conversion of ordered annotations into labeled code segments.
//!
//! Each annotation owns the lines from its marker line up to (not
//! including) the next annotation's line, or to end-of-file for the last
//! one. Segments therefore never overlap, never come out empty, and cover
//! every line from the first marker onward exactly once. Lines above the
//! first marker are never represented.

use std::path::Path;

use crate::annotations::{Annotation, MarkerKind};
use crate::segments::model::{CodeSegment, ExampleBuckets};

/// Builds one segment per annotation.
///
/// `annotations` must be in strictly increasing line order with every
/// index inside `lines`, which is what `annotations::scan` produces.
pub fn segment<S: AsRef<str>>(
    lines: &[S],
    annotations: &[Annotation],
    source_file: &Path,
) -> Vec<CodeSegment> {
    debug_assert!(
        annotations
            .windows(2)
            .all(|w| w[0].line_index < w[1].line_index),
        "annotations must be strictly line-ordered"
    );

    annotations
        .iter()
        .enumerate()
        .filter(|(_, annotation)| annotation.line_index < lines.len())
        .map(|(i, annotation)| {
            let start_line = annotation.line_index;
            let end_line = annotations
                .get(i + 1)
                .map_or(lines.len(), |next| next.line_index.min(lines.len()));
            let text = lines[start_line..end_line]
                .iter()
                .map(AsRef::as_ref)
                .collect::<String>();

            CodeSegment {
                kind: annotation.kind,
                start_line,
                end_line,
                text,
                source_file: source_file.to_path_buf(),
            }
        })
        .collect()
}

/// Partitions segments into dangerous (positive) and safe (negative)
/// buckets, keeping file order within each.
pub fn bucket(segments: Vec<CodeSegment>) -> ExampleBuckets {
    let (dangerous, safe) = segments
        .into_iter()
        .partition(|s| s.kind == MarkerKind::Positive);
    ExampleBuckets { dangerous, safe }
}
