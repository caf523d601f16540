pub mod languages;
pub mod load;
pub mod model;

pub use model::{GENERIC_LANGUAGE, PATTERN_FIELDS, RuleDefinition, RuleDocument};
