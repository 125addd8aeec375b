use crate::error::{ReleaseError, Result};
use git2::{ObjectType, Repository as Git2Repo, StatusOptions};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open the repository rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::open(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn credentials(
        username_from_url: Option<&str>,
        allowed_types: git2::CredentialType,
    ) -> std::result::Result<git2::Cred, git2::Error> {
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }
        }
        git2::Cred::default()
    }
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Ok("HEAD".to_string());
        }
        Ok(head.shorthand().unwrap_or("HEAD").to_string())
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(false).include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn commit_paths(&self, paths: &[PathBuf], message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;
        debug!("committed {} file(s) as {}", paths.len(), oid);

        let id = oid.to_string();
        Ok(id[..7.min(id.len())].to_string())
    }

    fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        let target = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.repo.signature()?;

        self.repo
            .tag(name, &target, &signature, message, false)
            .map_err(|e| ReleaseError::remote(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote '{}': {}", remote, e)))?;

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            Self::credentials(username_from_url, allowed_types)
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => {
                warn!("Could not update reference {}: {}", refname, status);
                Err(git2::Error::from_str(&format!("Push failed for {}", refname)))
            }
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspecs: Vec<String> = refspecs
            .iter()
            .map(|r| format!("{}:{}", r, r))
            .collect();
        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        remote_handle
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| match e.class() {
                git2::ErrorClass::Net => {
                    ReleaseError::remote(format!("Network error during push: {}", e))
                }
                _ => ReleaseError::remote(format!("Push to '{}' failed: {}", remote, e)),
            })?;

        Ok(())
    }

    fn remote_url(&self, remote: &str) -> Result<Option<String>> {
        match self.repo.find_remote(remote) {
            Ok(handle) => Ok(handle.url().map(str::to_string)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use std::fs;

    fn init_repo() -> (tempfile::TempDir, Git2Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Git2Repo::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Release Tool").unwrap();
            config.set_str("user.email", "release@example.com").unwrap();
        }
        fs::write(dir.path().join("setup.py"), "requires = []\n").unwrap();

        let repo = Git2Repository::from_git2(repo);
        {
            let mut index = repo.repo.index().unwrap();
            index.add_path(Path::new("setup.py")).unwrap();
            index.write().unwrap();
            let tree = repo.repo.find_tree(index.write_tree().unwrap()).unwrap();
            let sig = repo.repo.signature().unwrap();
            repo.repo
                .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
                .unwrap();
        }
        (dir, repo)
    }

    #[test]
    fn test_clean_repository_state() {
        let (_dir, repo) = init_repo();
        assert!(!repo.is_dirty().unwrap());
        assert!(repo.list_tags().unwrap().is_empty());
        assert!(!repo.current_branch().unwrap().is_empty());
        assert_eq!(repo.remote_url("origin").unwrap(), None);
    }

    #[test]
    fn test_commit_and_tag() {
        let (dir, repo) = init_repo();
        fs::write(dir.path().join("setup.py"), "requires = ['a==1.0.0']\n").unwrap();
        assert!(repo.is_dirty().unwrap());

        let id = repo
            .commit_paths(&[PathBuf::from("setup.py")], "Bump version 0.1.0 --> 0.1.1")
            .unwrap();
        assert_eq!(id.len(), 7);
        assert!(!repo.is_dirty().unwrap());

        repo.create_tag("v0.1.1", "v0.1.1").unwrap();
        assert_eq!(repo.list_tags().unwrap(), vec!["v0.1.1"]);
        assert!(repo.create_tag("v0.1.1", "again").is_err());
    }
}
