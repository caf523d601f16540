use crate::TOOL_NAME;
use crate::report::model::{CorpusReport, DoctorReport, SampleReport, ScanReport, ValidationReport};

pub fn render_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", TOOL_NAME, report.tool.version));
    out.push_str(&format!(
        "Rule: {} [{}] ({})\n",
        report.rule.id, report.rule.severity, report.rule.language
    ));
    if let Some(fixture) = &report.fixture {
        out.push_str(&format!(
            "Fixture: {} ({} dangerous, {} safe segments)\n",
            fixture.path.display(),
            fixture.dangerous_segments,
            fixture.safe_segments
        ));
    }
    push_side(&mut out, "Positive", &report.positive);
    push_side(&mut out, "Negative", &report.negative);
    out.push_str(&format!("Verdict: {}\n", report.status));
    if !report.verdict.diagnostics().is_empty() {
        out.push_str("Diagnostics:\n");
        for line in report.verdict.diagnostics() {
            out.push_str(&format!("  - {line}\n"));
        }
    }
    out
}

fn push_side(out: &mut String, label: &str, side: &SampleReport) {
    let result = &side.result;
    match result.failure {
        Some(code) => {
            out.push_str(&format!("{label}: {code} ({} bytes submitted)\n", side.sample_bytes));
        }
        None => {
            out.push_str(&format!(
                "{label}: {} match(es) ({} bytes submitted)\n",
                result.match_count(),
                side.sample_bytes
            ));
        }
    }
}

pub fn render_scan_text(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} annotation(s) for `{}` in {} [{}]\n",
        report.annotations.len(),
        report.rule_id,
        report.fixture.display(),
        report.match_mode.as_str()
    ));
    for segment in &report.segments {
        out.push_str(&format!(
            "  {:>8} lines {}-{}\n",
            segment.kind.as_str(),
            segment.start_line + 1,
            segment.end_line
        ));
    }
    out
}

pub fn render_corpus_text(report: &CorpusReport) -> String {
    let s = &report.stats;
    let mut out = String::new();
    out.push_str(&format!("Corpus: {}\n", report.root.display()));
    out.push_str(&format!("Rules found: {}\n", s.total_rules));
    out.push_str(&format!("Rules processed: {}\n", s.processed_rules));
    out.push_str(&format!("Examples extracted: {}\n", s.examples));
    out.push_str(&format!("Skipped (no fixtures): {}\n", s.no_fixtures));
    out.push_str(&format!("Skipped (no annotations): {}\n", s.no_annotations));
    out.push_str(&format!("Skipped (invalid rule): {}\n", s.invalid_rules));
    out
}

pub fn render_doctor_text(report: &DoctorReport) -> String {
    let mut out = String::new();
    match &report.engine.resolved {
        Some(path) => {
            out.push_str(&format!("engine: {} ({})\n", report.engine.program, path.display()));
        }
        None => {
            out.push_str(&format!("engine: {} (not found)\n", report.engine.program));
        }
    }
    if let Some(version) = &report.version {
        out.push_str(&format!("version: {version}\n"));
    }
    out.push_str(&format!("timeout: {}ms\n", report.engine.timeout_ms));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{MatchMode, scan};
    use crate::pipeline::scan_fixture;
    use crate::corpus::{CorpusExtraction, CorpusStats};
    use crate::engine::{CliEngine, EngineConfig};
    use crate::report::model::{ScanReport, ToolInfo};
    use std::path::Path;

    fn tool() -> ToolInfo {
        ToolInfo {
            name: "rulecheck".into(),
            version: "0.1.0".into(),
        }
    }

    #[test]
    fn scan_text_lists_segments_with_one_based_lines() {
        let text = "x = 1\n# ruleid: r\neval(x)\n# ok: r\nprint(x)\n";
        let scanned = scan_fixture(text, Path::new("f.py"), "r", MatchMode::Exact).unwrap();
        let report = ScanReport::new(
            ToolInfo {
                name: "rulecheck".into(),
                version: "0.1.0".into(),
            },
            MatchMode::Exact,
            text,
            scanned,
        );

        let rendered = render_scan_text(&report);
        assert!(rendered.starts_with("2 annotation(s) for `r` in f.py [exact]"));
        assert!(rendered.contains("positive lines 2-3"));
        assert!(rendered.contains("negative lines 4-5"));

        // the scanner alone agrees with the report
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        assert_eq!(scan(&lines, "r", MatchMode::Exact), report.annotations);
    }

    #[test]
    fn corpus_text_lists_every_counter() {
        let extraction = CorpusExtraction {
            stats: CorpusStats {
                total_rules: 4,
                processed_rules: 1,
                examples: 2,
                no_fixtures: 1,
                no_annotations: 1,
                invalid_rules: 1,
            },
            ..CorpusExtraction::default()
        };
        let report = CorpusReport::new(tool(), Path::new("rules"), MatchMode::Exact, extraction);

        assert_eq!(
            render_corpus_text(&report),
            "Corpus: rules\n\
             Rules found: 4\n\
             Rules processed: 1\n\
             Examples extracted: 2\n\
             Skipped (no fixtures): 1\n\
             Skipped (no annotations): 1\n\
             Skipped (invalid rule): 1\n"
        );
    }

    #[test]
    fn doctor_text_for_missing_engine() {
        let engine = CliEngine::new(
            EngineConfig::default().with_program("rulecheck-engine-that-is-not-installed"),
        );
        let report = DoctorReport::new(tool(), &engine, None);

        assert_eq!(
            render_doctor_text(&report),
            "engine: rulecheck-engine-that-is-not-installed (not found)\ntimeout: 30000ms\n"
        );
    }
}
