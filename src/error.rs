use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for release-tool operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Section '{section}' is not valid in {}", path.display())]
    InvalidSection { path: PathBuf, section: String },

    #[error("Something is wrong with line in {}: {line}", path.display())]
    MalformedLine { path: PathBuf, line: String },

    #[error("Failed to parse {}: {reason}", path.display())]
    MalformedChangelog { path: PathBuf, reason: String },

    #[error("No changelog entry for {0}!")]
    EmptyChangelog(String),

    #[error("Tag {tag} is already present in repo {repo}")]
    TagAlreadyExists { tag: String, repo: String },

    #[error("Failed to find {what} in {}", path.display())]
    MissingDeclaration { what: String, path: PathBuf },

    #[error("Operation already executed: {0}")]
    AlreadyExecuted(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    #[error("New version for {0} was already decided in this run")]
    VersionAlreadySet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-tool
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ReleaseError::Remote(msg.into())
    }

    pub fn missing(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        ReleaseError::MissingDeclaration {
            what: what.into(),
            path: path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReleaseError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ReleaseError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_tag_exists_message_names_repo() {
        let err = ReleaseError::TagAlreadyExists {
            tag: "v1.2.3".to_string(),
            repo: "lbrynet".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tag v1.2.3 is already present in repo lbrynet"
        );
    }

    #[test]
    fn test_missing_declaration_includes_path() {
        let err = ReleaseError::missing("__version__", "/tmp/pkg/__init__.py");
        let msg = err.to_string();
        assert!(msg.contains("__version__"));
        assert!(msg.contains("/tmp/pkg/__init__.py"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (ReleaseError::config("x"), "Configuration error"),
            (ReleaseError::version("x"), "Invalid version"),
            (ReleaseError::remote("x"), "Remote operation failed"),
            (ReleaseError::EmptyChangelog("x".into()), "No changelog entry"),
            (ReleaseError::AlreadyExecuted("x".into()), "Operation already"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
