// Shared fixtures: a temp directory holding one Python package checkout per
// configured repository.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use release_tool::config::{Config, RepositorySettings};
use release_tool::git::MockRepository;
use release_tool::workspace::Workspace;
use tempfile::TempDir;

pub struct Fixture {
    pub root: TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            root: TempDir::new().unwrap(),
            config: Config::default(),
        }
    }

    pub fn dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    pub fn read(&self, name: &str, file: &str) -> String {
        fs::read_to_string(self.dir(name).join(file)).unwrap()
    }

    /// Add a repository whose module is `name`, pinning `requires` in setup.py.
    /// `unreleased` is the raw text under `## [Unreleased]`.
    pub fn repo(&mut self, name: &str, version: &str, requires: &[(&str, &str)], unreleased: &str) {
        let dir = self.dir(name);
        fs::create_dir_all(dir.join(name)).unwrap();
        fs::write(
            dir.join(name).join("__init__.py"),
            format!("import logging\n\n__version__ = \"{}\"\nversion = tuple(__version__.split('.'))\n", version),
        )
        .unwrap();

        let mut setup = String::from("from setuptools import setup\n\nrequires = [\n    'Twisted',\n");
        for (module, pinned) in requires {
            setup.push_str(&format!("    '{}=={}',\n", module, pinned));
        }
        setup.push_str(&format!("]\n\nsetup(name=\"{}\", install_requires=requires)\n", name));
        fs::write(dir.join("setup.py"), setup).unwrap();

        fs::write(
            dir.join("CHANGELOG.md"),
            format!(
                "# Changelog\nAll notable changes to this project will be documented in this file.\n\n\
                 ## [Unreleased]\n{}\n## [0.0.1] - 2017-01-01\n### Added\n * first release\n",
                unreleased
            ),
        )
        .unwrap();

        self.config.repositories.push(RepositorySettings {
            name: name.to_string(),
            module: None,
            path: dir.to_string_lossy().into_owned(),
            remote: format!("lbryio/{}", name),
            branch: "master".to_string(),
            depends_on: requires.iter().map(|(m, _)| m.to_string()).collect(),
        });
    }

    /// Give `name` a requirements.txt with a pip git link per pinned module
    pub fn requirements_txt(&self, name: &str, requires: &[(&str, &str)]) {
        let mut text = String::from("Twisted==16.6.0\n");
        for (module, pinned) in requires {
            text.push_str(&format!(
                "git+https://github.com/lbryio/{m}.git@v{v}#egg={m}\n",
                m = module,
                v = pinned
            ));
        }
        fs::write(self.dir(name).join("requirements.txt"), text).unwrap();
    }

    pub fn workspace(&self) -> Workspace {
        self.workspace_with(|_| MockRepository::new())
    }

    pub fn workspace_with<F: Fn(&str) -> MockRepository>(&self, mock: F) -> Workspace {
        Workspace::load(&self.config, |settings| Ok(mock(&settings.name))).unwrap()
    }
}

pub const FIXED_ENTRY: &str = "### Fixed\n * crash on startup\n";
