pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod github;
pub mod manifest;
pub mod plan;
pub mod ui;
pub mod workspace;

pub use error::{ReleaseError, Result};
