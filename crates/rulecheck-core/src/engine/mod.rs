pub mod config;
pub mod invoke;
pub mod output;
pub mod result;

pub use config::{DEFAULT_ENGINE_PROGRAM, DEFAULT_TIMEOUT, EngineConfig};
pub use invoke::{CliEngine, Engine, validate_pair};
pub use result::{EngineError, FailureCode, Match, ValidationResult, ValidationSample};
