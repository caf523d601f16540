//! Adapter behavior against scripted stand-ins for the analysis engine.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rulecheck_core::engine::{
    CliEngine, Engine, EngineConfig, FailureCode, ValidationSample, validate_pair,
};
use rulecheck_core::rules::{RuleDefinition, RuleDocument};
use rulecheck_core::verdict::decide;
use tempfile::TempDir;

/// Serializes tests in this file so no fork can inherit a script's write
/// handle while another test executes it (ETXTBSY).
static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// True once `pid` is gone or a zombie, polling for up to two seconds.
///
/// Killed workers are re-parented, so reaping is up to whoever adopts them.
fn exits_soon(pid: &str) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if !is_running(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn is_running(pid: &str) -> bool {
    if Path::new("/proc/self").exists() {
        return match fs::read_to_string(format!("/proc/{pid}/stat")) {
            // The state follows the parenthesized command name.
            Ok(stat) => stat
                .rsplit_once(')')
                .is_some_and(|(_, rest)| !rest.trim_start().starts_with('Z')),
            Err(_) => false,
        };
    }
    std::process::Command::new("/bin/sh")
        .arg("-c")
        .arg(format!("kill -0 {pid} 2>/dev/null"))
        .status()
        .unwrap()
        .success()
}

const RULE: &str = r#"
rules:
  - id: py-eval
    message: eval of dynamic input
    languages: [python]
    severity: ERROR
    pattern: eval(...)
"#;

fn rule() -> RuleDefinition {
    RuleDocument::from_yaml_str(RULE).unwrap().rules.remove(0)
}

/// Writes an executable `/bin/sh` script. `$last` holds the sample path and
/// `$2` the rule path.
fn fake_engine(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-engine");
    fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn engine(program: &Path, timeout: Duration) -> CliEngine {
    CliEngine::new(
        EngineConfig::default()
            .with_program(program.to_str().unwrap())
            .with_timeout(timeout),
    )
}

/// Reports a match whenever the sample contains `eval(`.
const GREP_EVAL: &str = r#"
if grep -q 'eval(' "$last"; then
  echo '{"results":[{"message":"m"}],"errors":[]}'
else
  echo '{"results":[],"errors":[]}'
fi
"#;

#[test]
fn detecting_rule_passes() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let engine = engine(&fake_engine(dir.path(), GREP_EVAL), Duration::from_secs(10));
    assert!(engine.is_available());

    let (pos, neg) = validate_pair(
        &engine,
        &rule(),
        &ValidationSample::new("eval(user_input)\n", "python"),
        &ValidationSample::new("print(user_input)\n", "python"),
    );

    assert!(pos.success && neg.success);
    assert_eq!(pos.match_count(), 1);
    assert_eq!(neg.match_count(), 0);

    let verdict = decide(&pos, &neg);
    assert!(verdict.passed());
    assert!(verdict.positive_detected());
    assert!(!verdict.negative_detected());
}

#[test]
fn silent_rule_fails() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let program = fake_engine(dir.path(), r#"echo '{"results":[],"errors":[]}'"#);
    let engine = engine(&program, Duration::from_secs(10));

    let (pos, neg) = validate_pair(
        &engine,
        &rule(),
        &ValidationSample::new("eval(x)\n", "python"),
        &ValidationSample::new("", "python"),
    );

    assert!(pos.success);
    assert!(!decide(&pos, &neg).passed());
}

#[test]
fn missing_fields_default_to_empty() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let engine = engine(&fake_engine(dir.path(), "echo '{}'"), Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert!(r.success);
    assert!(r.matches.is_empty());
    assert!(r.errors.is_empty());
}

#[test]
fn slow_engine_is_killed_at_deadline() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("engine.pid");
    let program = fake_engine(
        dir.path(),
        &format!("echo $$ > '{}'\nexec sleep 10", pid_file.display()),
    );
    let engine = engine(&program, Duration::from_millis(500));

    let started = Instant::now();
    let r = engine.run_one(&rule(), &ValidationSample::new("eval(x)\n", "python"));

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!r.success);
    assert!(r.timed_out);
    assert_eq!(r.failure, Some(FailureCode::EngineTimeout));
    assert!(r.matches.is_empty());

    let pid = fs::read_to_string(&pid_file).unwrap();
    assert!(exits_soon(pid.trim()), "engine process {} outlived the timeout", pid.trim());
}

#[test]
fn forked_workers_are_killed_at_deadline() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let worker_pid = dir.path().join("worker.pid");
    let program = fake_engine(
        dir.path(),
        &format!("sleep 30 &\necho $! > '{}'\nwait", worker_pid.display()),
    );
    let engine = engine(&program, Duration::from_millis(500));

    let started = Instant::now();
    let r = engine.run_one(&rule(), &ValidationSample::new("eval(x)\n", "python"));

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(r.failure, Some(FailureCode::EngineTimeout));

    let pid = fs::read_to_string(&worker_pid).unwrap();
    assert!(exits_soon(pid.trim()), "engine worker {} outlived the timeout", pid.trim());
}

#[test]
fn lingering_workers_are_killed_after_normal_exit() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let worker_pid = dir.path().join("worker.pid");
    let program = fake_engine(
        dir.path(),
        &format!(
            "sleep 30 &\necho $! > '{}'\necho '{{\"results\":[]}}'",
            worker_pid.display()
        ),
    );
    let engine = engine(&program, Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert!(r.success);

    let pid = fs::read_to_string(&worker_pid).unwrap();
    assert!(exits_soon(pid.trim()), "engine worker {} outlived the call", pid.trim());
}

#[test]
fn scratch_files_are_removed_after_each_call() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let seen = dir.path().join("seen.txt");
    let program = fake_engine(
        dir.path(),
        &format!(
            "echo \"$2\" >> '{seen}'\necho \"$last\" >> '{seen}'\necho '{{\"results\":[]}}'",
            seen = seen.display()
        ),
    );
    let engine = engine(&program, Duration::from_secs(10));

    let ok = engine.run_one(&rule(), &ValidationSample::new("eval(x)\n", "python"));
    assert!(ok.success);

    let recorded = fs::read_to_string(&seen).unwrap();
    let paths: Vec<&str> = recorded.lines().collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with("rule.yaml"));
    assert!(paths[1].ends_with(".py"), "sample should carry the language extension");
    for path in &paths {
        assert!(!Path::new(path).exists(), "{path} left behind");
    }
}

#[test]
fn scratch_files_are_removed_after_timeout() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let seen = dir.path().join("seen.txt");
    let program = fake_engine(
        dir.path(),
        &format!("echo \"$2\" > '{}'\nexec sleep 10", seen.display()),
    );
    let engine = engine(&program, Duration::from_millis(500));

    let r = engine.run_one(&rule(), &ValidationSample::new("eval(x)\n", "python"));
    assert_eq!(r.failure, Some(FailureCode::EngineTimeout));

    let rule_path = fs::read_to_string(&seen).unwrap();
    let rule_path = Path::new(rule_path.trim());
    assert!(!rule_path.exists());
    assert!(!rule_path.parent().unwrap().exists());
}

#[test]
fn rule_file_round_trips_through_engine_input() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let copy = dir.path().join("submitted.yaml");
    let program = fake_engine(
        dir.path(),
        &format!("cp \"$2\" '{}'\necho '{{\"results\":[]}}'", copy.display()),
    );
    let engine = engine(&program, Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert!(r.success);

    let submitted = RuleDocument::from_yaml_str(&fs::read_to_string(&copy).unwrap()).unwrap();
    assert_eq!(submitted.rules, vec![rule()]);
}

#[test]
fn garbage_stdout_is_malformed_and_preserved() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let program = fake_engine(dir.path(), "echo 'Traceback: something broke'");
    let engine = engine(&program, Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert!(!r.success);
    assert_eq!(r.failure, Some(FailureCode::MalformedEngineOutput));
    assert!(r.raw.unwrap().contains("Traceback"));
}

#[test]
fn nonzero_exit_with_errors_only_is_reported_errors() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let program = fake_engine(
        dir.path(),
        r#"echo '{"results":[],"errors":[{"message":"invalid pattern","level":"error"}]}'
echo 'rule failed to parse' >&2
exit 7"#,
    );
    let engine = engine(&program, Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert!(!r.success);
    assert_eq!(r.failure, Some(FailureCode::EngineReportedErrors));
    assert_eq!(r.exit_code, Some(7));
    assert_eq!(r.errors[0].message, "invalid pattern");
    assert_eq!(r.raw.as_deref(), Some("rule failed to parse"));

    let verdict = decide(&r, &r);
    assert!(
        verdict
            .diagnostics()
            .iter()
            .any(|d| d == "positive: engine error: invalid pattern")
    );
}

#[test]
fn nonzero_exit_without_json_keeps_stderr() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let program = fake_engine(dir.path(), "echo 'segfault' >&2\nexit 139");
    let engine = engine(&program, Duration::from_secs(10));

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert_eq!(r.failure, Some(FailureCode::EngineExitStatus));
    assert_eq!(r.exit_code, Some(139));
    assert_eq!(r.raw.as_deref(), Some("segfault"));
}

#[test]
fn extra_args_precede_the_sample_path() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let argv = dir.path().join("argv.txt");
    let program = fake_engine(
        dir.path(),
        &format!(
            "printf '%s\\n' \"$@\" > '{}'\necho '{{\"results\":[]}}'",
            argv.display()
        ),
    );
    let engine = CliEngine::new(
        EngineConfig {
            program: program.to_str().unwrap().to_string(),
            timeout: Duration::from_secs(10),
            extra_args: vec!["--metrics=off".into()],
        },
    );

    assert!(engine.run_one(&rule(), &ValidationSample::new("x\n", "python")).success);

    let recorded = fs::read_to_string(&argv).unwrap();
    let args: Vec<&str> = recorded.lines().collect();
    assert_eq!(args[0], "--config");
    assert_eq!(args[2], "--json");
    assert_eq!(args[3], "--metrics=off");
    assert!(args[4].ends_with(".py"));
    assert_eq!(args.len(), 5);
}

#[test]
fn non_executable_program_is_unavailable() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("not-executable");
    fs::write(&path, "#!/bin/sh\necho '{}'\n").unwrap();

    let engine = engine(&path, Duration::from_secs(10));
    assert!(!engine.is_available());

    let r = engine.run_one(&rule(), &ValidationSample::new("x\n", "python"));
    assert_eq!(r.failure, Some(FailureCode::EngineUnavailable));
}

#[test]
fn version_reads_first_output() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let program = fake_engine(dir.path(), "echo '1.2.3'");
    let engine = engine(&program, Duration::from_secs(10));

    assert_eq!(engine.version().unwrap().as_deref(), Some("1.2.3"));
}
