//! Locating rule documents and their fixture files on disk.
//!
//! Conventions:
//! - a rule document is a `.yaml`/`.yml` file that is not itself a test or
//!   autofix artifact (`*.test.*`, `*.fixed.*`)
//! - fixtures carry an extension of one of the rule's languages and are
//!   either named after the rule's file stem, test files beside the rule
//!   whose name mentions the stem, or anything inside a sibling `tests/`

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::rules::GENERIC_LANGUAGE;
use crate::rules::languages::extensions_for;

/// Directory names never descended into.
const SKIPPED_DIRS: &[&str] = &[".git", ".github"];

const FIXTURE_SUBDIR: &str = "tests";

pub fn is_rule_file(path: &Path) -> bool {
    let is_yaml = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    is_yaml && !is_test_artifact(path)
}

fn is_test_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.contains(".test.") || name.contains(".fixed."))
}

/// Every rule document under `root`, sorted by path.
///
/// Unreadable entries are logged and skipped.
pub fn find_rule_files(root: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && SKIPPED_DIRS.iter().any(|d| e.file_name() == OsStr::new(d)))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable corpus entry");
                continue;
            }
        };
        if entry.file_type().is_file() && is_rule_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    files
}

/// Fixture files for the rule document at `rule_path`.
///
/// For every extension mapped to `languages` (`generic` when none are
/// given) this collects:
/// - `<stem><ext>` beside the rule
/// - `*test*<ext>` beside the rule whose name contains `<stem>`
/// - every `*<ext>` in a sibling `tests/` directory
///
/// The rule itself and autofix outputs are excluded.
pub fn find_fixtures(rule_path: &Path, languages: &[String]) -> Vec<PathBuf> {
    let Some(stem) = rule_path.file_stem().and_then(OsStr::to_str) else {
        return Vec::new();
    };
    let dir = rule_path.parent().unwrap_or_else(|| Path::new(""));
    let beside = files_in(dir);
    let in_tests = files_in(&dir.join(FIXTURE_SUBDIR));

    let generic = [GENERIC_LANGUAGE.to_string()];
    let languages = if languages.is_empty() {
        &generic[..]
    } else {
        languages
    };

    let mut found = BTreeSet::new();
    for language in languages {
        for ext in extensions_for(language) {
            for path in &beside {
                let Some(name) = name_before(path, ext) else {
                    continue;
                };
                if name == stem || (name.contains("test") && name.contains(stem)) {
                    found.insert(path.clone());
                }
            }
            for path in &in_tests {
                if name_before(path, ext).is_some() {
                    found.insert(path.clone());
                }
            }
        }
    }
    found.retain(|path| path != rule_path && !is_test_artifact(path));
    found.into_iter().collect()
}

/// File name of `path` with `ext` stripped, when it ends in `ext`.
fn name_before<'a>(path: &'a Path, ext: &str) -> Option<&'a str> {
    let name = path.file_name()?.to_str()?;
    name.strip_suffix(ext).filter(|rest| !rest.is_empty())
}

/// Regular files directly inside `dir`; empty when `dir` does not exist.
fn files_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable fixture entry");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect()
}
