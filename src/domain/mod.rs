//! Domain logic - versions and changelogs, independent of git and the filesystem layout

pub mod changelog;
pub mod version;

pub use changelog::{ChangelogDocument, Section};
pub use version::{BumpKind, Version, VersionBump};
