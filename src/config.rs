use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::debug;
use regex::{Captures, Regex};

use crate::error::{ReleaseError, Result};

/// Name of the configuration file looked up in the working directory and home.
pub const CONFIG_FILE_NAME: &str = ".release-tool.yml";

/// Represents the complete configuration for release-tool.
///
/// Repositories are kept in declaration order, which is also the order
/// dependents are visited in when a bump propagates.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub repositories: Vec<RepositorySettings>,
}

fn default_branch() -> String {
    "master".to_string()
}

/// One managed repository.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepositorySettings {
    pub name: String,

    /// Python module name; defaults to `name`
    #[serde(default)]
    pub module: Option<String>,

    /// Local checkout. `~` and `$VAR` are expanded.
    pub path: String,

    /// GitHub `owner/repo`
    pub remote: String,

    /// Branch releases are cut from
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Modules of other configured repositories this one pins
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl RepositorySettings {
    pub fn module(&self) -> &str {
        self.module.as_deref().unwrap_or(&self.name)
    }

    pub fn directory(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.path))
    }
}

impl Config {
    /// Parse configuration text; `.toml` paths are read as TOML, anything else as YAML.
    pub fn from_str_for(path: &Path, text: &str) -> Result<Self> {
        let config: Config = if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(text).map_err(|e| {
                ReleaseError::config(format!("{}: {}", path.display(), e))
            })?
        } else {
            serde_yaml::from_str(text).map_err(|e| {
                ReleaseError::config(format!("{}: {}", path.display(), e))
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn repository(&self, name: &str) -> Option<&RepositorySettings> {
        self.repositories.iter().find(|r| r.name == name)
    }

    /// Names and modules must be unique, and every dependency must be a
    /// configured module.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut modules = HashSet::new();
        for repo in &self.repositories {
            if !names.insert(repo.name.as_str()) {
                return Err(ReleaseError::config(format!(
                    "repository '{}' is configured twice",
                    repo.name
                )));
            }
            if !modules.insert(repo.module()) {
                return Err(ReleaseError::config(format!(
                    "module '{}' is configured twice",
                    repo.module()
                )));
            }
        }
        for repo in &self.repositories {
            if let Some(unknown) = repo
                .depends_on
                .iter()
                .find(|dep| !modules.contains(dep.as_str()))
            {
                return Err(ReleaseError::config(format!(
                    "repository '{}' depends on unknown module '{}'",
                    repo.name, unknown
                )));
            }
        }
        Ok(())
    }
}

/// Loads configuration from file.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `.release-tool.yml` in current directory
/// 3. `~/.release-tool.yml` in the user's home directory
///
/// # Returns
/// * `Ok(Config)` - Loaded configuration
/// * `Err` - If no file is found, or it cannot be read, parsed or validated
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let path = match config_path {
        Some(path) => PathBuf::from(expand_path(path)),
        None => default_config_path().ok_or_else(|| {
            ReleaseError::config(format!("Config file ({}) is missing", CONFIG_FILE_NAME))
        })?,
    };

    if !path.is_file() {
        return Err(ReleaseError::config(format!(
            "Config file ({}) is missing",
            path.display()
        )));
    }

    debug!("loading configuration from {}", path.display());
    let text = fs::read_to_string(&path)?;
    Config::from_str_for(&path, &text)
}

fn default_config_path() -> Option<PathBuf> {
    let local = Path::new(".").join(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

fn env_reference() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))").unwrap())
}

/// Expand a leading `~` and `$VAR` / `${VAR}` references. Unset variables are
/// left as written.
pub fn expand_path(path: &str) -> String {
    let expanded = env_reference().replace_all(path, |caps: &Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    match expanded.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => format!("{}{}", home.display(), rest),
            None => expanded.into_owned(),
        },
        _ => expanded.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
repositories:
  - name: lbryschema
    path: /src/lbryschema
    remote: lbryio/lbryschema
  - name: lbryum
    path: /src/lbryum
    remote: lbryio/lbryum
    depends_on: [lbryschema]
  - name: lbrynet
    path: /src/lbrynet
    remote: lbryio/lbry
    branch: main
    depends_on: [lbryschema, lbryum]
"#;

    #[test]
    fn test_parse_yaml_keeps_declaration_order() {
        let config = Config::from_str_for(Path::new("x.yml"), YAML).unwrap();
        let names: Vec<_> = config.repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["lbryschema", "lbryum", "lbrynet"]);
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_str_for(Path::new("x.yml"), YAML).unwrap();
        let schema = config.repository("lbryschema").unwrap();
        assert_eq!(schema.module(), "lbryschema");
        assert_eq!(schema.branch, "master");
        assert!(schema.depends_on.is_empty());
        assert_eq!(config.repository("lbrynet").unwrap().branch, "main");
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let yaml = "repositories:\n  - name: a\n    path: /a\n    remote: o/a\n    depends_on: [b]\n";
        let err = Config::from_str_for(Path::new("x.yml"), yaml).unwrap_err();
        assert!(err.to_string().contains("unknown module 'b'"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let yaml = "repositories:\n  - name: a\n    path: /a\n    remote: o/a\n  - name: a\n    path: /b\n    remote: o/b\n";
        assert!(Config::from_str_for(Path::new("x.yml"), yaml).is_err());
    }

    #[test]
    fn test_expand_path_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(
            expand_path("~/src/lbry"),
            format!("{}/src/lbry", home.display())
        );
        assert_eq!(expand_path("/abs/~x"), "/abs/~x");
    }

    #[test]
    fn test_expand_path_keeps_unset_variables() {
        assert_eq!(
            expand_path("$RELEASE_TOOL_SURELY_UNSET/x"),
            "$RELEASE_TOOL_SURELY_UNSET/x"
        );
    }
}
