use crate::domain::Version;
use crate::error::Result;
use crate::manifest;
use crate::plan::stack::{Apply, OperationStack};
use crate::workspace::Workspace;

/// A file rewrite queued by the planner
#[derive(Debug, Clone, PartialEq)]
pub enum FileEdit {
    /// Stamp the unreleased changelog entries with `version` and reset the block
    ReleaseChangelog { version: Version },
    /// Rewrite `__version__`
    SetVersion { version: Version },
    /// Rewrite the `setup.py` pin of `dependency`
    PinRequirement {
        dependency: String,
        version: Version,
    },
    /// Rewrite the `requirements.txt` git link of `dependency`
    PinRequirementLink {
        dependency: String,
        version: Version,
        remote: String,
    },
}

/// Operations produced by planning a bump
pub type BumpPlan = OperationStack<FileEdit>;

impl Apply<Workspace> for FileEdit {
    fn apply(&self, repo: &str, workspace: &mut Workspace) -> Result<()> {
        let state = workspace.get_mut(repo)?;
        match self {
            FileEdit::ReleaseChangelog { version } => state.changelog_mut().bump(version),
            FileEdit::SetVersion { version } => {
                manifest::write_version(&state.directory, &state.module, version)
            }
            FileEdit::PinRequirement {
                dependency,
                version,
            } => manifest::write_requirement(&state.directory, dependency, version),
            FileEdit::PinRequirementLink {
                dependency,
                version,
                remote,
            } => manifest::write_requirement_link(&state.directory, dependency, version, remote),
        }
    }
}
