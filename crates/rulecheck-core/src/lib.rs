pub mod annotations;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod segments;
pub mod verdict;

pub use pipeline::{
    FixtureScan, FixtureValidation, PairValidation, extract_examples, scan_fixture,
    validate_fixture, validate_texts,
};

pub const TOOL_NAME: &str = "rulecheck";

/// JSON schema version of rulecheck reports.
/// Bump only when the serialized report shape changes semantically.
pub const SCHEMA_VERSION: &str = "0.1.0";
