pub mod model;
pub mod render;

pub use model::{
    ArtifactHash, CorpusReport, DoctorReport, EXIT_FAILED, EXIT_NO_EVIDENCE, EXIT_PASSED,
    EngineInfo, FixtureInfo, RuleInfo, SampleReport, ScanReport, ToolInfo, ValidationReport,
    ValidationStatus,
};
pub use render::{render_corpus_text, render_doctor_text, render_scan_text, render_text};
