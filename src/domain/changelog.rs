//! Changelog document model.
//!
//! A changelog is split into three parts: the `header` (up to and including the
//! `## [Unreleased]` line), the unreleased entries grouped by section, and the
//! `trailer` (from the first dated release header onwards). Only the unreleased
//! block is interpreted; header and trailer are carried through verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use log::debug;
use regex::Regex;

use crate::domain::version::Version;
use crate::error::{ReleaseError, Result};

/// Sections allowed in the unreleased block, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Security,
    Fixed,
    Deprecated,
    Changed,
    Added,
    Removed,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Security,
        Section::Fixed,
        Section::Deprecated,
        Section::Changed,
        Section::Added,
        Section::Removed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Security => "Security",
            Section::Fixed => "Fixed",
            Section::Deprecated => "Deprecated",
            Section::Changed => "Changed",
            Section::Added => "Added",
            Section::Removed => "Removed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Section::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn unreleased_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^## \[Unreleased\]").unwrap())
}

fn release_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^## \[.*\] - \d{4}-\d{2}-\d{2}").unwrap())
}

// any other top-level header inside the unreleased block means the block was
// never terminated by a release header
fn stray_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^## ").unwrap())
}

fn section_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^### (.*)$").unwrap())
}

// a bullet with no text, possibly glued to a word like `*TODO`
fn empty_entry() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w*\*\w*$").unwrap())
}

fn entry_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\* (.*)$").unwrap())
}

/// Where the line scanner currently is relative to the unreleased block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    BeforeUnreleased,
    InUnreleased,
    AfterUnreleased,
}

/// Entries not yet attached to a release, keyed by section
pub type Unreleased = BTreeMap<Section, Vec<String>>;

/// A parsed `CHANGELOG.md`
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogDocument {
    repository: String,
    path: PathBuf,
    header: Vec<String>,
    unreleased: Unreleased,
    trailer: Vec<String>,
}

impl ChangelogDocument {
    /// Read and parse the changelog at `path`
    pub fn load(repository: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path)?;
        Self::parse(repository, path, &text)
    }

    /// Parse changelog text. `path` is only used for error messages and writing.
    pub fn parse(
        repository: impl Into<String>,
        path: impl Into<PathBuf>,
        text: &str,
    ) -> Result<Self> {
        let path = path.into();
        let mut state = ParseState::BeforeUnreleased;
        let mut header = Vec::new();
        let mut block = Vec::new();
        let mut trailer = Vec::new();

        for line in text.lines() {
            state = match state {
                ParseState::BeforeUnreleased => {
                    header.push(line.to_string());
                    if unreleased_marker().is_match(line) {
                        ParseState::InUnreleased
                    } else {
                        ParseState::BeforeUnreleased
                    }
                }
                ParseState::InUnreleased => {
                    if release_marker().is_match(line) {
                        trailer.push(line.to_string());
                        ParseState::AfterUnreleased
                    } else if stray_header().is_match(line) {
                        return Err(ReleaseError::MalformedChangelog {
                            path,
                            reason: format!("unexpected section header found: {}", line),
                        });
                    } else {
                        block.push(line);
                        ParseState::InUnreleased
                    }
                }
                ParseState::AfterUnreleased => {
                    trailer.push(line.to_string());
                    ParseState::AfterUnreleased
                }
            };
        }

        if state == ParseState::BeforeUnreleased {
            return Err(ReleaseError::MalformedChangelog {
                path,
                reason: "no '## [Unreleased]' section".to_string(),
            });
        }

        let unreleased = normalize(&path, &block)?;

        Ok(ChangelogDocument {
            repository: repository.into(),
            path,
            header,
            unreleased,
            trailer,
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn trailer(&self) -> &[String] {
        &self.trailer
    }

    pub fn unreleased(&self) -> &Unreleased {
        &self.unreleased
    }

    pub fn entries(&self, section: Section) -> &[String] {
        self.unreleased
            .get(&section)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.unreleased.values().all(Vec::is_empty)
    }

    /// The normalized unreleased block as lines
    pub fn unreleased_lines(&self) -> Vec<String> {
        render_sections(&self.unreleased)
    }

    /// Release notes for `version`, dated today
    pub fn release_message(&self, version: &Version) -> Result<String> {
        self.release_message_on(version, Local::now().date_naive())
    }

    pub fn release_message_on(&self, version: &Version, date: NaiveDate) -> Result<String> {
        self.ensure_entries()?;
        Ok(format!(
            "{}\n{}",
            release_header(version, date),
            self.unreleased_lines().join("\n")
        ))
    }

    /// Full file contents after releasing `version` on `date`: the unreleased
    /// block becomes an empty template and its entries move under a dated
    /// release header.
    pub fn render_release(&self, version: &Version, date: NaiveDate) -> Result<String> {
        self.ensure_entries()?;

        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&template());
        out.push_str(&release_header(version, date));
        out.push('\n');
        for line in self.unreleased_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push('\n');
        for line in &self.trailer {
            out.push_str(line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Record the release of `version` on disk and reset the unreleased block
    pub fn bump(&mut self, version: &Version) -> Result<()> {
        self.bump_on(version, Local::now().date_naive())
    }

    pub fn bump_on(&mut self, version: &Version, date: NaiveDate) -> Result<()> {
        let contents = self.render_release(version, date)?;
        fs::write(&self.path, contents)?;
        debug!("wrote release {} to {}", version, self.path.display());

        let mut trailer = vec![release_header(version, date)];
        trailer.extend(self.unreleased_lines());
        trailer.push(String::new());
        trailer.append(&mut self.trailer);
        self.trailer = trailer;
        self.unreleased.clear();
        Ok(())
    }

    /// Add or refresh the entry noting that `module` is now required at `version`.
    ///
    /// An existing entry for the same module is rewritten in place, wherever it
    /// is; otherwise the entry goes to the end of the `Changed` section.
    pub fn record_dependency_bump(&mut self, module: &str, version: &Version) {
        let marker = format!("Bumped `{}`", module);
        let entry = format!("Bumped `{}` requirement to {}", module, version);

        for entries in self.unreleased.values_mut() {
            if let Some(existing) = entries.iter_mut().find(|e| e.starts_with(&marker)) {
                *existing = entry;
                return;
            }
        }
        self.unreleased
            .entry(Section::Changed)
            .or_default()
            .push(entry);
    }

    fn ensure_entries(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ReleaseError::EmptyChangelog(self.repository.clone()));
        }
        Ok(())
    }
}

/// Group raw unreleased lines into sections.
///
/// Blank lines and placeholder bullets are dropped; a section listed twice is
/// merged; an entry outside any section is rejected.
pub fn normalize<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<Unreleased> {
    let mut sections = Unreleased::new();
    let mut current: Option<Section> = None;

    for raw in lines {
        let line = raw.as_ref().trim();
        if line.is_empty() || empty_entry().is_match(line) {
            continue;
        }
        if let Some(caps) = section_header().captures(line) {
            let name = caps[1].trim();
            current = Some(Section::from_name(name).ok_or_else(|| ReleaseError::InvalidSection {
                path: path.to_path_buf(),
                section: name.to_string(),
            })?);
            continue;
        }
        match (entry_line().captures(line), current) {
            (Some(caps), Some(section)) => {
                sections
                    .entry(section)
                    .or_default()
                    .push(caps[1].to_string());
            }
            _ => {
                return Err(ReleaseError::MalformedLine {
                    path: path.to_path_buf(),
                    line: line.to_string(),
                })
            }
        }
    }
    Ok(sections)
}

fn render_sections(sections: &Unreleased) -> Vec<String> {
    let mut lines = Vec::new();
    for (section, entries) in sections {
        if entries.is_empty() {
            continue;
        }
        lines.push(format!("### {}", section));
        lines.extend(entries.iter().map(|e| format!(" * {}", e)));
        lines.push(String::new());
    }
    lines
}

fn release_header(version: &Version, date: NaiveDate) -> String {
    format!("## [{}] - {}", version, date.format("%Y-%m-%d"))
}

/// Empty scaffold written back after a release
pub fn template() -> String {
    let mut out = String::new();
    for section in Section::ALL {
        out.push_str(&format!("### {}\n  *\n  *\n\n", section));
    }
    out.push('\n');
    out
}
