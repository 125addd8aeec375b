//! Command line workflow, kept apart from argument parsing in `main.rs`.

pub mod orchestration;

pub use orchestration::{open_repositories, run_bump, BumpArgs, BumpOutcome, ShippedRepo};
