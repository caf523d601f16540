pub mod discover;
pub mod extract;

pub use discover::{find_fixtures, find_rule_files, is_rule_file};
pub use extract::{
    CorpusExtraction, CorpusStats, RuleExamples, SkipReason, SkippedRule, extract_corpus,
};
