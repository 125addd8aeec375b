//! Git operations abstraction layer
//!
//! The planner only needs a snapshot of each repository (branch, dirty flag,
//! existing tags); the command line flow additionally commits, tags and
//! pushes. Both go through the [Repository] trait:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for tests

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use std::path::PathBuf;

use crate::error::Result;

/// Version control operations on one checked-out repository
pub trait Repository {
    /// Name of the checked-out branch, or `HEAD` when detached
    fn current_branch(&self) -> Result<String>;

    /// Whether tracked files have uncommitted changes
    fn is_dirty(&self) -> Result<bool>;

    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Stage `paths` (relative to the repository root) and commit them on HEAD.
    ///
    /// # Returns
    /// * `Ok(String)` - Short id of the new commit
    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String>;

    /// Create an annotated tag on HEAD
    fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push refspecs (e.g. `refs/heads/master`, `refs/tags/v1.0.0`) to a remote
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;

    /// URL configured for a remote, if any
    fn remote_url(&self, remote: &str) -> Result<Option<String>>;
}

impl<T: Repository + ?Sized> Repository for &T {
    fn current_branch(&self) -> Result<String> {
        (**self).current_branch()
    }

    fn is_dirty(&self) -> Result<bool> {
        (**self).is_dirty()
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        (**self).list_tags()
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String> {
        (**self).commit_paths(paths, message)
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        (**self).create_tag(name, message)
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        (**self).push(remote, refspecs)
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        (**self).remote_url(remote)
    }
}
