use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

/// Mock repository for testing without actual git operations.
///
/// Commits, tags and pushes are recorded so tests can assert on them.
#[derive(Debug, Default)]
pub struct MockRepository {
    branch: String,
    dirty: bool,
    tags: RefCell<Vec<String>>,
    remotes: HashMap<String, String>,
    commits: RefCell<Vec<(Vec<PathBuf>, String)>>,
    pushes: RefCell<Vec<(String, Vec<String>)>>,
}

impl MockRepository {
    /// Create a clean mock repository on `master`
    pub fn new() -> Self {
        MockRepository {
            branch: "master".to_string(),
            ..Default::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_dirty(mut self, dirty: bool) -> Self {
        self.dirty = dirty;
        self
    }

    pub fn with_tag(self, name: impl Into<String>) -> Self {
        self.tags.borrow_mut().push(name.into());
        self
    }

    pub fn with_remote(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.remotes.insert(name.into(), url.into());
        self
    }

    /// Commits made so far: staged paths and message
    pub fn commits(&self) -> Vec<(Vec<PathBuf>, String)> {
        self.commits.borrow().clone()
    }

    /// Pushes made so far: remote and refspecs
    pub fn pushes(&self) -> Vec<(String, Vec<String>)> {
        self.pushes.borrow().clone()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.tags.borrow().clone())
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String> {
        let mut commits = self.commits.borrow_mut();
        commits.push((paths.to_vec(), message.to_string()));
        Ok(format!("{:07x}", commits.len()))
    }

    fn create_tag(&self, name: &str, _message: &str) -> Result<()> {
        let mut tags = self.tags.borrow_mut();
        if tags.iter().any(|t| t == name) {
            return Err(ReleaseError::remote(format!("Tag '{}' already exists", name)));
        }
        tags.push(name.to_string());
        Ok(())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        if !self.remotes.contains_key(remote) {
            return Err(ReleaseError::remote(format!(
                "Cannot find remote '{}'",
                remote
            )));
        }
        self.pushes
            .borrow_mut()
            .push((remote.to_string(), refspecs.to_vec()));
        Ok(())
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        Ok(self.remotes.get(remote).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_basic() {
        let repo = MockRepository::new().with_dirty(true);
        assert_eq!(repo.current_branch().unwrap(), "master");
        assert!(repo.is_dirty().unwrap());
    }

    #[test]
    fn test_mock_repository_tags() {
        let repo = MockRepository::new().with_tag("v1.0.0");
        repo.create_tag("v1.0.1", "v1.0.1").unwrap();
        assert!(repo.create_tag("v1.0.0", "again").is_err());
        assert_eq!(repo.list_tags().unwrap(), vec!["v1.0.0", "v1.0.1"]);
    }

    #[test]
    fn test_mock_repository_records_commits_and_pushes() {
        let repo = MockRepository::new().with_remote("origin", "git@github.com:o/r.git");
        repo.commit_paths(&[PathBuf::from("setup.py")], "bump").unwrap();
        repo.push("origin", &["refs/tags/v1.0.0".to_string()]).unwrap();
        assert!(repo.push("upstream", &[]).is_err());

        assert_eq!(repo.commits().len(), 1);
        assert_eq!(repo.pushes()[0].1, vec!["refs/tags/v1.0.0"]);
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.list_tags().unwrap().is_empty());
        assert_eq!(repo.remote_url("origin").unwrap(), None);
    }
}
