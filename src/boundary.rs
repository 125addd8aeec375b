use std::fmt;

/// Non-fatal conditions noticed while loading a repository.
/// These are reported to the user but never stop a run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// Tracked files have uncommitted changes
    DirtyWorkingTree { repo: String },
    /// The checkout is not on the branch releases are cut from
    OffReleaseBranch {
        repo: String,
        branch: String,
        expected: String,
    },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::DirtyWorkingTree { repo } => {
                write!(f, "{} has uncommitted changes", repo)
            }
            BoundaryWarning::OffReleaseBranch {
                repo,
                branch,
                expected,
            } => {
                write!(
                    f,
                    "{} is on branch '{}' (releases are cut from '{}')",
                    repo, branch, expected
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages() {
        let dirty = BoundaryWarning::DirtyWorkingTree {
            repo: "lbryum".to_string(),
        };
        assert_eq!(dirty.to_string(), "lbryum has uncommitted changes");

        let branch = BoundaryWarning::OffReleaseBranch {
            repo: "lbrynet".to_string(),
            branch: "feature".to_string(),
            expected: "master".to_string(),
        };
        assert!(branch.to_string().contains("'feature'"));
    }
}
