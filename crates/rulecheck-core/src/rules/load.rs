use std::path::Path;

use crate::error::RuleLoadError;
use crate::rules::model::{RuleDefinition, RuleDocument};

impl RuleDocument {
    /// Parses and validates a rule document.
    ///
    /// Validation is limited to what the pipeline depends on: at least one
    /// rule, non-empty ids, and a pattern field on every rule.
    pub fn from_yaml_str(source: &str) -> Result<Self, RuleLoadError> {
        let doc: RuleDocument = serde_yaml::from_str(source)?;
        doc.validate()?;
        Ok(doc)
    }

    pub fn load(path: &Path) -> Result<Self, RuleLoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| RuleLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Looks up a rule by exact id.
    pub fn rule(&self, id: &str) -> Result<&RuleDefinition, RuleLoadError> {
        self.rules
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| RuleLoadError::UnknownRule { id: id.to_string() })
    }

    /// The first rule, which corpus tooling treats as the document's subject.
    pub fn primary(&self) -> Result<&RuleDefinition, RuleLoadError> {
        self.rules.first().ok_or(RuleLoadError::NoRules)
    }

    fn validate(&self) -> Result<(), RuleLoadError> {
        if self.rules.is_empty() {
            return Err(RuleLoadError::NoRules);
        }
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(RuleLoadError::MissingId { index });
            }
            if !rule.has_pattern() {
                return Err(RuleLoadError::MissingPatterns {
                    id: rule.id.clone(),
                });
            }
        }
        Ok(())
    }
}
