//! Validation adapter around the external analysis engine CLI.
//!
//! Responsibilities:
//! - Resolve the engine program once, at construction
//! - Materialize the rule and sample as scratch files
//! - Run `<engine> --config <rule> --json <sample>` under a wall-clock budget
//! - Map exit status and stdout onto a `ValidationResult`
//!
//! The engine runs as the leader of its own process group and the whole
//! group is killed once the call is over, so workers it forks cannot
//! outlive it. Scratch files are owned by a guard and released on every
//! exit path. Standard streams are redirected to scratch files rather than
//! pipes so a chatty engine can never block on a full pipe while we wait.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::engine::config::EngineConfig;
use crate::engine::output::parse_engine_output;
use crate::engine::result::{FailureCode, ValidationResult, ValidationSample};
use crate::rules::RuleDefinition;
use crate::rules::languages::sample_extension;

#[cfg(windows)]
const EXECUTABLE_SUFFIXES: &[&str] = &["", ".exe", ".cmd", ".bat"];
#[cfg(not(windows))]
const EXECUTABLE_SUFFIXES: &[&str] = &[""];

/// Evaluates a rule against one sample.
///
/// Implementations must not panic on engine failure; every outcome is a
/// `ValidationResult`.
pub trait Engine: Send + Sync {
    fn run_one(&self, rule: &RuleDefinition, sample: &ValidationSample) -> ValidationResult;
}

/// Runs the positive and negative samples, returning `(positive, negative)`.
///
/// The two calls share nothing, so the negative sample runs on a scoped
/// worker thread while the positive one runs on the caller's.
pub fn validate_pair(
    engine: &dyn Engine,
    rule: &RuleDefinition,
    positive: &ValidationSample,
    negative: &ValidationSample,
) -> (ValidationResult, ValidationResult) {
    let parent = tracing::Span::current();
    thread::scope(|scope| {
        let negative_run = scope.spawn(move || {
            let _parent = parent.entered();
            let _role = tracing::info_span!("sample", role = "negative").entered();
            engine.run_one(rule, negative)
        });
        let positive_result = {
            let _role = tracing::info_span!("sample", role = "positive").entered();
            engine.run_one(rule, positive)
        };
        let negative_result = negative_run
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (positive_result, negative_result)
    })
}

/// Engine adapter that shells out to a CLI program.
#[derive(Debug, Clone)]
pub struct CliEngine {
    config: EngineConfig,
    /// `None` when the program could not be resolved; fixed for the
    /// lifetime of the adapter.
    program: Option<PathBuf>,
}

impl CliEngine {
    pub fn new(config: EngineConfig) -> Self {
        let program = resolve_program(&config.program);
        match &program {
            Some(path) => debug!(program = %path.display(), "engine resolved"),
            None => warn!(program = %config.program, "engine not found on PATH"),
        }
        Self { config, program }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolved location of the engine program, if any.
    pub fn program(&self) -> Option<&Path> {
        self.program.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.program.is_some()
    }

    /// Runs `<engine> --version` under the configured timeout.
    ///
    /// Returns `Ok(None)` when the engine is unavailable or does not answer
    /// in time.
    pub fn version(&self) -> Result<Option<String>> {
        let Some(program) = self.program.as_deref() else {
            return Ok(None);
        };

        let capture = tempfile::Builder::new()
            .prefix("rulecheck-")
            .tempfile()
            .context("create version capture")?;
        let stdout = capture.reopen().context("open version capture")?;

        let mut command = Command::new(program);
        command
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::null());

        let status = run_bounded(&mut command, self.config.timeout)
            .with_context(|| format!("run {} --version", program.display()))?;
        match status {
            Some(status) if status.success() => {
                Ok(Some(read_lossy(capture.path())?.trim().to_string()))
            }
            _ => Ok(None),
        }
    }

    fn invoke(
        &self,
        program: &Path,
        rule: &RuleDefinition,
        sample: &ValidationSample,
    ) -> Result<ValidationResult> {
        let scratch = Scratch::create(rule, sample)?;

        let stdout_file = std::fs::File::create(&scratch.stdout_path)
            .with_context(|| format!("create {}", scratch.stdout_path.display()))?;
        let stderr_file = std::fs::File::create(&scratch.stderr_path)
            .with_context(|| format!("create {}", scratch.stderr_path.display()))?;

        let mut command = Command::new(program);
        command
            .arg("--config")
            .arg(&scratch.rule_path)
            .arg("--json")
            .args(&self.config.extra_args)
            .arg(&scratch.sample_path)
            .current_dir(scratch.dir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout_file))
            .stderr(Stdio::from(stderr_file));

        let started = Instant::now();
        let status = run_bounded(&mut command, self.config.timeout)
            .with_context(|| format!("run {}", program.display()))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(elapsed_ms, "engine exited");

        let stdout = read_lossy(&scratch.stdout_path)?;
        let stderr = read_lossy(&scratch.stderr_path)?;
        Ok(interpret(status, &stdout, &stderr, self.config.timeout))
    }
}

impl Engine for CliEngine {
    fn run_one(&self, rule: &RuleDefinition, sample: &ValidationSample) -> ValidationResult {
        let span = tracing::info_span!("engine_run", rule_id = %rule.id, language = %sample.language);
        let _entered = span.enter();

        let Some(program) = self.program.as_deref() else {
            warn!(program = %self.config.program, "engine unavailable; not invoking");
            return ValidationResult::failed(
                FailureCode::EngineUnavailable,
                Some(format!(
                    "engine `{}` is not installed or not on PATH",
                    self.config.program
                )),
            );
        };

        match self.invoke(program, rule, sample) {
            Ok(result) => result,
            Err(err) => {
                let detail = format!("{err:#}");
                warn!(error = %detail, "engine invocation failed");
                ValidationResult::failed(FailureCode::ArtifactIo, Some(detail))
            }
        }
    }
}

/// Maps a finished (or timed-out) engine run onto a result.
///
/// `status == None` means the run was killed at the deadline; whatever it
/// printed is discarded.
pub fn interpret(
    status: Option<ExitStatus>,
    stdout: &str,
    stderr: &str,
    timeout: Duration,
) -> ValidationResult {
    let Some(status) = status else {
        let timeout_ms = timeout.as_millis() as u64;
        warn!(timeout_ms, "engine timed out; process killed");
        return ValidationResult::failed(
            FailureCode::EngineTimeout,
            Some(format!("engine exceeded {timeout_ms}ms timeout")),
        );
    };

    let exit_code = status.code();
    if status.success() {
        return match parse_engine_output(stdout) {
            Ok(parsed) => {
                debug!(
                    matches = parsed.matches.len(),
                    errors = parsed.errors.len(),
                    "engine run completed"
                );
                ValidationResult::completed(parsed.matches, parsed.errors)
            }
            Err(err) => {
                warn!(error = %err, "engine output is malformed");
                ValidationResult::failed(FailureCode::MalformedEngineOutput, Some(stdout.to_string()))
                    .with_exit_code(exit_code)
            }
        };
    }

    match parse_engine_output(stdout) {
        Ok(parsed) if parsed.matches.is_empty() && !parsed.errors.is_empty() => {
            warn!(?exit_code, errors = parsed.errors.len(), "engine reported errors");
            ValidationResult::failed(FailureCode::EngineReportedErrors, non_empty(stderr))
                .with_errors(parsed.errors)
                .with_exit_code(exit_code)
        }
        Ok(parsed) => {
            warn!(?exit_code, errors = parsed.errors.len(), "engine exited with failure status");
            ValidationResult::failed(FailureCode::EngineExitStatus, non_empty(stderr))
                .with_errors(parsed.errors)
                .with_exit_code(exit_code)
        }
        Err(_) => {
            warn!(?exit_code, "engine exited with failure status");
            ValidationResult::failed(FailureCode::EngineExitStatus, non_empty(stderr))
                .with_exit_code(exit_code)
        }
    }
}

/// Scratch directory holding one call's rule, sample and captured streams.
/// Removed when dropped.
struct Scratch {
    dir: TempDir,
    rule_path: PathBuf,
    sample_path: PathBuf,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
}

impl Scratch {
    fn create(rule: &RuleDefinition, sample: &ValidationSample) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("rulecheck-")
            .tempdir()
            .context("create scratch directory")?;

        let rule_path = dir.path().join("rule.yaml");
        let yaml = rule
            .to_engine_yaml()
            .with_context(|| format!("serialize rule `{}`", rule.id))?;
        std::fs::write(&rule_path, yaml)
            .with_context(|| format!("write {}", rule_path.display()))?;

        let sample_path = dir
            .path()
            .join(format!("sample{}", sample_extension(&sample.language)));
        std::fs::write(&sample_path, &sample.text)
            .with_context(|| format!("write {}", sample_path.display()))?;

        Ok(Self {
            stdout_path: dir.path().join("stdout.json"),
            stderr_path: dir.path().join("stderr.txt"),
            dir,
            rule_path,
            sample_path,
        })
    }
}

/// Runs `command` as the leader of a new process group and waits at most
/// `timeout` for it to exit.
///
/// Returns `None` when the deadline passed. The whole group is killed and
/// the leader reaped before this returns, on either outcome.
fn run_bounded(command: &mut Command, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut group = ProcessGroup::spawn(command)?;
        let status = match tokio::time::timeout(timeout, group.child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => None,
        };
        group.terminate().await;
        Ok::<_, std::io::Error>(status)
    })
}

/// Engine process leading its own process group.
///
/// Dropping it before `terminate` still signals the group; the leader is
/// killed through `kill_on_drop`.
struct ProcessGroup {
    child: Child,
    /// Equal to the leader's pid.
    pgid: Option<u32>,
    terminated: bool,
}

impl ProcessGroup {
    fn spawn(command: &mut Command) -> std::io::Result<Self> {
        #[cfg(unix)]
        command.process_group(0);
        command.kill_on_drop(true);

        let child = command.spawn()?;
        let pgid = child.id();
        Ok(Self {
            child,
            pgid,
            terminated: false,
        })
    }

    async fn terminate(&mut self) {
        self.kill_group();
        if !matches!(self.child.try_wait(), Ok(Some(_))) {
            if let Err(err) = self.child.kill().await {
                debug!(error = %err, "kill engine process");
            }
        }
        self.terminated = true;
    }

    #[cfg(unix)]
    fn kill_group(&self) {
        let Some(pgid) = self.pgid else {
            return;
        };
        // SAFETY: killpg only delivers a signal; no memory crosses the call.
        let rc = unsafe { libc::killpg(pgid as libc::pid_t, libc::SIGKILL) };
        if rc != 0 {
            // ESRCH once every member has already exited.
            debug!(pgid, error = %std::io::Error::last_os_error(), "kill engine process group");
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        if !self.terminated {
            self.kill_group();
        }
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Finds `program` on `PATH`, or checks it directly when it is a path.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    let candidate = Path::new(program);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| {
            EXECUTABLE_SUFFIXES
                .iter()
                .map(move |suffix| dir.join(format!("{program}{suffix}")))
        })
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
