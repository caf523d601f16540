use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use rulecheck_core::annotations::MatchMode;

#[derive(Debug, Parser)]
#[command(
    name = "rulecheck",
    version,
    about = "Annotation-driven validation of static-analysis rules"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the annotations and segments a fixture carries for a rule
    Scan(ScanArgs),

    /// Validate a rule against the annotated examples in a fixture
    Validate(ValidateArgs),

    /// Validate a rule against an explicit vulnerable/safe file pair
    Check(CheckArgs),

    /// Extract labeled examples from every rule in a corpus
    Extract(ExtractArgs),

    /// Report whether the analysis engine can be found and run
    Doctor(DoctorArgs),
}

#[derive(Debug, clap::Args)]
pub struct ScanArgs {
    /// Fixture file to scan
    pub fixture: PathBuf,

    /// Rule id the markers must reference
    #[arg(long)]
    pub rule_id: String,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// Tool configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct ValidateArgs {
    /// Rule definition document (YAML)
    pub rule: PathBuf,

    /// Annotated fixture file
    pub fixture: PathBuf,

    /// Rule to validate; defaults to the first rule in the document
    #[arg(long)]
    pub rule_id: Option<String>,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Rule definition document (YAML)
    pub rule: PathBuf,

    /// Source the rule must match
    #[arg(long)]
    pub positive: PathBuf,

    /// Source the rule must not match
    #[arg(long)]
    pub negative: PathBuf,

    /// Rule to validate; defaults to the first rule in the document
    #[arg(long)]
    pub rule_id: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct ExtractArgs {
    /// Root of the rules corpus
    pub root: PathBuf,

    #[command(flatten)]
    pub mode: ModeArgs,

    /// Tool configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, clap::Args)]
pub struct EngineArgs {
    /// Engine program name or path
    #[arg(long)]
    pub engine: Option<String>,

    /// Per-call engine timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Tool configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct ModeArgs {
    /// How marker ids are matched against the rule id
    #[arg(long)]
    pub match_mode: Option<MatchModeArg>,
}

#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MatchModeArg {
    Exact,
    SubstringCompat,
}

impl From<MatchModeArg> for MatchMode {
    fn from(arg: MatchModeArg) -> Self {
        match arg {
            MatchModeArg::Exact => MatchMode::Exact,
            MatchModeArg::SubstringCompat => MatchMode::SubstringCompat,
        }
    }
}
