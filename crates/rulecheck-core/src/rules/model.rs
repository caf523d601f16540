use serde::{Deserialize, Serialize};

/// Language assumed when a rule declares none.
pub const GENERIC_LANGUAGE: &str = "generic";

/// Top-level keys that carry a rule's matching logic. A rule must declare
/// at least one of them; their contents are never interpreted here.
pub const PATTERN_FIELDS: &[&str] = &[
    "pattern",
    "patterns",
    "pattern-either",
    "pattern-regex",
    "pattern-sources",
    "pattern-sinks",
    "match",
];

/// A rule definition document: `{rules: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

/// One rule from a definition document.
///
/// Only `id`, the first language and the presence of a pattern field are
/// inspected. Every other key lands in `body` and is forwarded to the
/// engine unchanged, in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(flatten)]
    pub body: serde_yaml::Mapping,
}

impl RuleDefinition {
    /// `languages[0]`, or `generic` when the rule lists none.
    pub fn primary_language(&self) -> &str {
        self.languages
            .first()
            .map(String::as_str)
            .unwrap_or(GENERIC_LANGUAGE)
    }

    pub fn has_pattern(&self) -> bool {
        PATTERN_FIELDS
            .iter()
            .any(|field| self.body.contains_key(*field))
    }

    /// Renders this rule alone as an engine configuration document.
    pub fn to_engine_yaml(&self) -> Result<String, serde_yaml::Error> {
        #[derive(Serialize)]
        struct SingleRule<'a> {
            rules: [&'a RuleDefinition; 1],
        }

        serde_yaml::to_string(&SingleRule { rules: [self] })
    }
}
