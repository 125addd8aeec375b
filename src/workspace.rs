//! Per-run state of every configured repository.
//!
//! A [`Workspace`] is built once per invocation from the configuration and the
//! repositories on disk, handed to the planner, and then used as the context
//! the planned operations are executed against.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use log::debug;

use crate::boundary::BoundaryWarning;
use crate::config::{Config, RepositorySettings};
use crate::domain::{ChangelogDocument, Version};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::manifest;

/// Everything known about one repository during a run
#[derive(Debug, Clone)]
pub struct RepositoryState {
    pub name: String,
    pub module: String,
    pub directory: PathBuf,
    /// GitHub `owner/repo`
    pub remote: String,
    pub release_branch: String,
    /// Modules this repository pins
    pub depends_on: Vec<String>,
    /// Checked-out branch when the run started
    pub branch: String,
    pub dirty: bool,
    pub tags: BTreeSet<String>,
    pub current_version: Version,
    /// Pins in `setup.py` for configured modules, as written
    pub requirements: BTreeMap<String, String>,
    pub has_requirements_file: bool,
    /// Packages with an `egg=` git link in requirements.txt
    pub requirement_links: BTreeSet<String>,
    new_version: Option<Version>,
    changelog: ChangelogDocument,
}

impl RepositoryState {
    /// Read the manifests, changelog and git state of one repository.
    ///
    /// `known_modules` limits which `setup.py` pins are kept.
    pub fn load(
        settings: &RepositorySettings,
        known_modules: &BTreeSet<String>,
        vcs: &dyn Repository,
    ) -> Result<Self> {
        let directory = settings.directory();
        let module = settings.module().to_string();

        let current_version = manifest::read_version(&directory, &module)?;
        let requirements = manifest::read_requirements(&directory)?
            .into_iter()
            .filter(|(name, _)| known_modules.contains(name))
            .collect();
        let changelog =
            ChangelogDocument::load(&settings.name, manifest::changelog_file(&directory))?;

        let state = RepositoryState {
            name: settings.name.clone(),
            module,
            remote: settings.remote.clone(),
            release_branch: settings.branch.clone(),
            depends_on: settings.depends_on.clone(),
            branch: vcs.current_branch()?,
            dirty: vcs.is_dirty()?,
            tags: vcs.list_tags()?.into_iter().collect(),
            current_version,
            requirements,
            has_requirements_file: manifest::requirements_file(&directory).is_file(),
            requirement_links: manifest::read_requirement_links(&directory)?,
            new_version: None,
            changelog,
            directory,
        };
        debug!(
            "loaded {} at {} ({})",
            state.name,
            state.current_version,
            state.directory.display()
        );
        Ok(state)
    }

    /// The version decided for this run, if any
    pub fn new_version(&self) -> Option<&Version> {
        self.new_version.as_ref()
    }

    /// Decide the version for this run. Can only happen once.
    pub fn set_new_version(&mut self, version: Version) -> Result<()> {
        if self.new_version.is_some() {
            return Err(ReleaseError::VersionAlreadySet(self.name.clone()));
        }
        self.new_version = Some(version);
        Ok(())
    }

    /// Fail if the tag for `version` already exists in this repository
    pub fn ensure_tag_absent(&self, version: &Version) -> Result<()> {
        let tag = version.tag();
        if self.tags.contains(&tag) {
            return Err(ReleaseError::TagAlreadyExists {
                tag,
                repo: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Whether this run ships a release candidate for this repository
    pub fn is_rc(&self) -> bool {
        self.new_version.is_some_and(|v| v.is_candidate())
    }

    /// Release notes for the new version; empty for candidates
    pub fn release_message(&self) -> Result<String> {
        match self.new_version {
            Some(version) if version.is_release() => self.changelog.release_message(&version),
            _ => Ok(String::new()),
        }
    }

    pub fn changelog(&self) -> &ChangelogDocument {
        &self.changelog
    }

    pub fn changelog_mut(&mut self) -> &mut ChangelogDocument {
        &mut self.changelog
    }

    pub fn version_file(&self) -> PathBuf {
        manifest::version_file(&self.directory, &self.module)
    }

    pub fn setup_file(&self) -> PathBuf {
        manifest::setup_file(&self.directory)
    }

    pub fn requirements_file(&self) -> PathBuf {
        manifest::requirements_file(&self.directory)
    }

    pub fn changelog_file(&self) -> &Path {
        self.changelog.path()
    }

    /// Files a bump commit of this repository should include
    pub fn files_to_commit(&self) -> Vec<PathBuf> {
        let mut files = vec![self.version_file(), self.setup_file()];
        if self.has_requirements_file {
            files.push(self.requirements_file());
        }
        if !self.is_rc() {
            files.push(self.changelog_file().to_path_buf());
        }
        files.into_iter().filter(|f| f.is_file()).collect()
    }

    pub fn warnings(&self) -> Vec<BoundaryWarning> {
        let mut warnings = Vec::new();
        if self.branch != self.release_branch {
            warnings.push(BoundaryWarning::OffReleaseBranch {
                repo: self.name.clone(),
                branch: self.branch.clone(),
                expected: self.release_branch.clone(),
            });
        }
        if self.dirty {
            warnings.push(BoundaryWarning::DirtyWorkingTree {
                repo: self.name.clone(),
            });
        }
        warnings
    }
}

/// All repositories of one run, in configuration order
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    repos: Vec<RepositoryState>,
}

impl Workspace {
    pub fn new(repos: Vec<RepositoryState>) -> Self {
        Workspace { repos }
    }

    /// Load every configured repository, opening its checkout with `open`.
    ///
    /// A repository that cannot be read (bad version, malformed changelog, ...)
    /// fails the whole load.
    pub fn load<R, F>(config: &Config, mut open: F) -> Result<Self>
    where
        R: Repository,
        F: FnMut(&RepositorySettings) -> Result<R>,
    {
        let known_modules: BTreeSet<String> = config
            .repositories
            .iter()
            .map(|r| r.module().to_string())
            .collect();

        let repos = config
            .repositories
            .iter()
            .map(|settings| {
                let vcs = open(settings)?;
                RepositoryState::load(settings, &known_modules, &vcs)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Workspace { repos })
    }

    pub fn get(&self, name: &str) -> Result<&RepositoryState> {
        self.repos
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| ReleaseError::UnknownRepository(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut RepositoryState> {
        self.repos
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| ReleaseError::UnknownRepository(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryState> {
        self.repos.iter()
    }

    /// Names of the repositories that depend on `module`, in configuration order
    pub fn dependents_of(&self, module: &str) -> Vec<String> {
        self.repos
            .iter()
            .filter(|r| r.depends_on.iter().any(|dep| dep == module))
            .map(|r| r.name.clone())
            .collect()
    }
}
