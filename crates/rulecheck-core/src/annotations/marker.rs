//! Marker syntax recognized inside fixture files.
//!
//! A marker is a comment declaring that the code that follows should
//! (`ruleid`) or should not (`ok`) be flagged by a rule:
//!
//! ```text
//! # ruleid: sql-injection
//! // ok = sql-injection
//! <!-- ruleid: xss -->
//! # todoruleid: sql-injection
//! ```
//!
//! The accepted forms are a closed table of `(lead, separator)` entries
//! matched against each position of a line once. Extending the syntax means
//! adding a row to `MARKER_SYNTAX` or a token to `COMMENT_TOKENS`.

use serde::{Deserialize, Serialize};

/// Referenced id that accepts every target rule.
pub const WILDCARD_ID: &str = "ALL";

/// Comment tokens that may introduce a marker.
pub const COMMENT_TOKENS: &[&str] = &["#", "//", "<!--", ";"];

/// Evidence polarity carried by a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// `ruleid`: the following code must be flagged.
    Positive,
    /// `ok`: the following code must not be flagged.
    Negative,
}

impl MarkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerKind::Positive => "positive",
            MarkerKind::Negative => "negative",
        }
    }
}

impl std::fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy deciding whether a marker's referenced id applies to a target rule.
///
/// `SubstringCompat` reproduces the legacy corpus behavior where a marker
/// for `foo-bar` also counts as evidence for `foo`. It is a compatibility
/// mode, not a correctness guarantee; use `Exact` when ids share prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Referenced id equals the target, or is the `ALL` wildcard.
    Exact,
    /// `Exact`, plus any referenced id containing the target.
    #[default]
    SubstringCompat,
}

impl MatchMode {
    pub fn accepts(self, referenced_id: &str, target_id: &str) -> bool {
        if referenced_id == target_id || referenced_id == WILDCARD_ID {
            return true;
        }
        match self {
            MatchMode::Exact => false,
            MatchMode::SubstringCompat => {
                !target_id.is_empty() && referenced_id.contains(target_id)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::SubstringCompat => "substring-compat",
        }
    }
}

impl std::str::FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(MatchMode::Exact),
            "substring-compat" => Ok(MatchMode::SubstringCompat),
            other => Err(format!("unknown match mode: {other}")),
        }
    }
}

/// One row of the marker syntax table.
#[derive(Debug, Clone, Copy)]
struct MarkerSyntax {
    /// Tokens that open the marker, compared ASCII case-insensitively.
    leads: &'static [&'static str],
    separator: char,
    /// Whether whitespace may sit between the keyword and the separator.
    space_before_separator: bool,
}

const MARKER_SYNTAX: &[MarkerSyntax] = &[
    MarkerSyntax {
        leads: COMMENT_TOKENS,
        separator: ':',
        space_before_separator: false,
    },
    MarkerSyntax {
        leads: COMMENT_TOKENS,
        separator: '=',
        space_before_separator: true,
    },
    MarkerSyntax {
        leads: &["todo"],
        separator: ':',
        space_before_separator: false,
    },
];

const KEYWORDS: &[(&str, MarkerKind)] = &[
    ("ruleid", MarkerKind::Positive),
    ("ok", MarkerKind::Negative),
];

/// A marker occurrence inside one line, before any target filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerHit<'a> {
    pub kind: MarkerKind,
    pub referenced_id: &'a str,
    /// Byte offset of the marker's lead token.
    pub offset: usize,
}

/// Outcome of classifying one line against a target rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMarker<'a> {
    Positive(&'a str),
    Negative(&'a str),
    NoMatch,
}

impl LineMarker<'_> {
    pub fn kind(&self) -> Option<MarkerKind> {
        match self {
            LineMarker::Positive(_) => Some(MarkerKind::Positive),
            LineMarker::Negative(_) => Some(MarkerKind::Negative),
            LineMarker::NoMatch => None,
        }
    }
}

/// Lists every marker occurrence in `line`, left to right, at most one per
/// starting offset.
pub fn markers_in_line(line: &str) -> Vec<MarkerHit<'_>> {
    let mut hits = Vec::new();
    for (offset, _) in line.char_indices() {
        let rest = &line[offset..];
        let hit = MARKER_SYNTAX.iter().find_map(|syntax| {
            syntax.leads.iter().find_map(|lead| {
                let after_lead = strip_prefix_ignore_ascii_case(rest, lead)?;
                parse_after_lead(after_lead, syntax)
            })
        });
        if let Some((kind, referenced_id)) = hit {
            hits.push(MarkerHit {
                kind,
                referenced_id,
                offset,
            });
        }
    }
    hits
}

/// Classifies `line` for `target_id`: the first accepted marker wins.
pub fn classify_line<'a>(line: &'a str, target_id: &str, mode: MatchMode) -> LineMarker<'a> {
    markers_in_line(line)
        .into_iter()
        .find(|hit| mode.accepts(hit.referenced_id, target_id))
        .map_or(LineMarker::NoMatch, |hit| match hit.kind {
            MarkerKind::Positive => LineMarker::Positive(hit.referenced_id),
            MarkerKind::Negative => LineMarker::Negative(hit.referenced_id),
        })
}

fn parse_after_lead<'a>(rest: &'a str, syntax: &MarkerSyntax) -> Option<(MarkerKind, &'a str)> {
    let rest = rest.trim_start();
    let (kind, rest) = KEYWORDS.iter().find_map(|(keyword, kind)| {
        strip_prefix_ignore_ascii_case(rest, keyword).map(|r| (*kind, r))
    })?;
    let rest = if syntax.space_before_separator {
        rest.trim_start()
    } else {
        rest
    };
    let rest = rest.strip_prefix(syntax.separator)?.trim_start();
    let end = rest.find(|c: char| !is_id_char(c)).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some((kind, &rest[..end]))
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

fn strip_prefix_ignore_ascii_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
