use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rulecheck_core::annotations::MatchMode;
use rulecheck_core::config::{ToolConfig, engine_config};
use rulecheck_core::corpus::extract_corpus;
use rulecheck_core::engine::CliEngine;
use rulecheck_core::pipeline::read_fixture;
use rulecheck_core::report::{
    CorpusReport, DoctorReport, EXIT_FAILED, EXIT_NO_EVIDENCE, EXIT_PASSED, EngineInfo,
    FixtureInfo, RuleInfo, ScanReport, ToolInfo, ValidationReport, render,
};
use rulecheck_core::rules::{RuleDefinition, RuleDocument};
use rulecheck_core::{TOOL_NAME, scan_fixture, validate_fixture, validate_texts};

mod args;

use args::{
    CheckArgs, Command, DoctorArgs, EngineArgs, ExtractArgs, ModeArgs, OutputArgs, OutputFormat,
    ScanArgs, ValidateArgs,
};

/// Exit code for usage, configuration and I/O errors.
const EXIT_ERROR: i32 = 2;

fn main() {
    let args = args::Args::parse();
    init_tracing(args.verbose);

    let code = match run(args.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            EXIT_ERROR
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Scan(args) => scan(args),
        Command::Validate(args) => validate(args),
        Command::Check(args) => check(args),
        Command::Extract(args) => extract(args),
        Command::Doctor(args) => doctor(args),
    }
}

fn scan(args: ScanArgs) -> Result<i32> {
    let config = load_config(args.config.as_deref())?;
    let mode = match_mode(&args.mode, &config);

    let text = read_fixture(&args.fixture)?;
    match scan_fixture(&text, &args.fixture, &args.rule_id, mode) {
        Ok(scanned) => {
            let report = ScanReport::new(tool(), mode, &text, scanned);
            emit(&args.output, &report, render::render_scan_text)?;
            Ok(EXIT_PASSED)
        }
        Err(err) if err.is_no_evidence() => {
            eprintln!("{err}");
            Ok(EXIT_NO_EVIDENCE)
        }
        Err(err) => Err(err.into()),
    }
}

fn validate(args: ValidateArgs) -> Result<i32> {
    let config = load_config(args.engine.config.as_deref())?;
    let mode = match_mode(&args.mode, &config);
    let doc = load_rules(&args.rule)?;
    let rule = select_rule(&doc, args.rule_id.as_deref())?;
    let engine = build_engine(&args.engine, &config)?;

    let outcome = match validate_fixture(&engine, rule, &args.fixture, mode) {
        Ok(outcome) => outcome,
        Err(err) if err.is_no_evidence() => {
            eprintln!("{err}");
            return Ok(EXIT_NO_EVIDENCE);
        }
        Err(err) => return Err(err.into()),
    };

    let fixture = FixtureInfo::new(&outcome.fixture, &outcome.buckets);
    let report = ValidationReport::new(
        tool(),
        rule_info(rule, &args.rule)?,
        Some(fixture),
        EngineInfo::new(&engine),
        outcome.pair,
    );
    emit(&args.output, &report, render::render_text)?;
    Ok(report.exit_code)
}

fn check(args: CheckArgs) -> Result<i32> {
    let config = load_config(args.engine.config.as_deref())?;
    let doc = load_rules(&args.rule)?;
    let rule = select_rule(&doc, args.rule_id.as_deref())?;
    let engine = build_engine(&args.engine, &config)?;

    let positive = read_fixture(&args.positive)?;
    let negative = read_fixture(&args.negative)?;
    let pair = validate_texts(&engine, rule, positive, negative);

    let report = ValidationReport::new(
        tool(),
        rule_info(rule, &args.rule)?,
        None,
        EngineInfo::new(&engine),
        pair,
    );
    emit(&args.output, &report, render::render_text)?;
    Ok(report.exit_code)
}

fn extract(args: ExtractArgs) -> Result<i32> {
    let config = load_config(args.config.as_deref())?;
    let mode = match_mode(&args.mode, &config);

    let extraction = extract_corpus(&args.root, mode)?;
    let report = CorpusReport::new(tool(), &args.root, mode, extraction);
    emit(&args.output, &report, render::render_corpus_text)?;
    Ok(EXIT_PASSED)
}

fn doctor(args: DoctorArgs) -> Result<i32> {
    let config = load_config(args.engine.config.as_deref())?;
    let engine = build_engine(&args.engine, &config)?;

    let version = engine.version().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "engine version check failed");
        None
    });
    let report = DoctorReport::new(tool(), &engine, version);
    emit(&args.output, &report, render::render_doctor_text)?;

    Ok(if report.available {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    })
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn load_config(path: Option<&Path>) -> Result<ToolConfig> {
    match path {
        Some(path) => Ok(ToolConfig::load_from(path)?),
        None => Ok(ToolConfig::default()),
    }
}

fn match_mode(args: &ModeArgs, config: &ToolConfig) -> MatchMode {
    args.match_mode
        .map(MatchMode::from)
        .unwrap_or(config.scan.match_mode)
}

/// Command-line values override the configuration file.
fn build_engine(args: &EngineArgs, config: &ToolConfig) -> Result<CliEngine> {
    let program = args.engine.as_deref().unwrap_or(&config.engine.program);
    let timeout_secs = args.timeout.unwrap_or(config.engine.timeout_secs);
    let extra_args = if args.engine_args.is_empty() {
        &config.engine.extra_args
    } else {
        &args.engine_args
    };
    Ok(CliEngine::new(engine_config(program, timeout_secs, extra_args)?))
}

fn load_rules(path: &Path) -> Result<RuleDocument> {
    RuleDocument::load(path).with_context(|| format!("loading rules from {}", path.display()))
}

fn select_rule<'a>(doc: &'a RuleDocument, rule_id: Option<&str>) -> Result<&'a RuleDefinition> {
    Ok(match rule_id {
        Some(id) => doc.rule(id)?,
        None => doc.primary()?,
    })
}

fn rule_info(rule: &RuleDefinition, path: &Path) -> Result<RuleInfo> {
    RuleInfo::new(rule, Some(path)).with_context(|| format!("serializing rule `{}`", rule.id))
}

fn emit<T: Serialize>(output: &OutputArgs, report: &T, render: fn(&T) -> String) -> Result<()> {
    let rendered = match output.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(report)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => render(report),
    };

    match &output.out {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}
