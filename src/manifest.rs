//! Reading and rewriting the declarations of a managed Python package.
//!
//! Layout relative to the repository root:
//! - `<module>/__init__.py` declares `__version__ = "x.y.z"`
//! - `setup.py` pins sibling packages as `'name==x.y.z'` entries
//! - `requirements.txt` (optional) pins them as pip git links ending in `#egg=name`
//!
//! Files are matched line by line with regular expressions and never executed.
//! Rewrites touch only the matched line.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::domain::Version;
use crate::error::{ReleaseError, Result};

pub const SETUP_FILE: &str = "setup.py";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

fn version_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^__version__\s*=\s*(['"])([^'"]*)['"]"#).unwrap())
}

fn pinned_requirement() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"['"]([A-Za-z0-9_.\-]+)==([^'"]+)['"]"#).unwrap())
}

fn egg_fragment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"egg=([A-Za-z0-9_.\-]+)").unwrap())
}

pub fn version_file(dir: &Path, module: &str) -> PathBuf {
    dir.join(module).join("__init__.py")
}

pub fn setup_file(dir: &Path) -> PathBuf {
    dir.join(SETUP_FILE)
}

pub fn requirements_file(dir: &Path) -> PathBuf {
    dir.join(REQUIREMENTS_FILE)
}

pub fn changelog_file(dir: &Path) -> PathBuf {
    dir.join(CHANGELOG_FILE)
}

/// The `__version__` declared by `module`
pub fn read_version(dir: &Path, module: &str) -> Result<Version> {
    let path = version_file(dir, module);
    let contents = fs::read_to_string(&path)?;
    let declared = contents
        .lines()
        .find_map(|line| version_declaration().captures(line))
        .ok_or_else(|| ReleaseError::missing("__version__", &path))?;
    Version::parse(&declared[2])
}

pub fn write_version(dir: &Path, module: &str, version: &Version) -> Result<()> {
    let path = version_file(dir, module);
    rewrite_line(&path, "__version__", |line| {
        version_declaration()
            .captures(line)
            .map(|caps| format!("__version__ = {q}{}{q}", version, q = &caps[1]))
    })
}

/// Every `name==version` pin in `setup.py`, wherever it sits on its line. A
/// repository without a `setup.py` pins nothing.
pub fn read_requirements(dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = setup_file(dir);
    if !path.is_file() {
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(&path)?;
    Ok(contents
        .lines()
        .flat_map(|line| pinned_requirement().captures_iter(line))
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect())
}

/// Point the `setup.py` pin of `name` at `version`. Only the quoted
/// `'name==x'` literal changes; the rest of the line is kept as is.
pub fn write_requirement(dir: &Path, name: &str, version: &Version) -> Result<()> {
    let path = setup_file(dir);
    let pattern = Regex::new(&format!(r#"(['"]){}==[^'"]+['"]"#, regex::escape(name)))
        .map_err(|e| ReleaseError::config(format!("invalid package name '{}': {}", name, e)))?;

    rewrite_line(&path, &format!("requirement for {}", name), |line| {
        pattern.is_match(line).then(|| {
            pattern
                .replace(line, |caps: &Captures| {
                    format!("{q}{}=={}{q}", name, version, q = &caps[1])
                })
                .into_owned()
        })
    })
}

/// Packages `requirements.txt` installs from git links (`egg=name`). A
/// repository without a `requirements.txt` links nothing.
pub fn read_requirement_links(dir: &Path) -> Result<BTreeSet<String>> {
    let path = requirements_file(dir);
    if !path.is_file() {
        return Ok(BTreeSet::new());
    }
    let contents = fs::read_to_string(&path)?;
    Ok(contents
        .lines()
        .filter_map(|line| egg_fragment().captures(line))
        .map(|caps| caps[1].to_string())
        .collect())
}

/// Point the `requirements.txt` git link for `name` at the tag of `version`
pub fn write_requirement_link(
    dir: &Path,
    name: &str,
    version: &Version,
    remote: &str,
) -> Result<()> {
    let path = requirements_file(dir);
    let pattern = Regex::new(&format!(r"egg={}(?:[^A-Za-z0-9_.\-]|$)", regex::escape(name)))
        .map_err(|e| ReleaseError::config(format!("invalid package name '{}': {}", name, e)))?;

    rewrite_line(&path, &format!("requirement for {}", name), |line| {
        pattern
            .is_match(line)
            .then(|| pip_link(remote, name, version))
    })
}

/// pip requirement installing `name` from the tag of `version` on GitHub
pub fn pip_link(remote: &str, name: &str, version: &Version) -> String {
    format!(
        "git+https://github.com/{}.git@{}#egg={}",
        remote,
        version.tag(),
        name
    )
}

// Replace the first line for which `replace` returns Some.
fn rewrite_line<F>(path: &Path, what: &str, replace: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let contents = fs::read_to_string(path)?;
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

    let (position, updated) = lines
        .iter()
        .enumerate()
        .find_map(|(i, line)| replace(line).map(|new| (i, new)))
        .ok_or_else(|| ReleaseError::missing(what, path))?;
    lines[position] = updated;

    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}
