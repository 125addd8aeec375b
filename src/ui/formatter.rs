//! Pure formatting functions for UI output.
//!
//! The `format_*` functions build the text and are what the tests look at;
//! the `display_*` functions print it.

use std::path::PathBuf;

use console::style;

use crate::boundary::BoundaryWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Summary printed once the planned edits are on disk
pub fn format_written(operations: usize, files: usize) -> String {
    let plural = |n: usize| if n == 1 { "" } else { "s" };
    format!(
        "Wrote {} change{} to {} file{}",
        operations,
        plural(operations),
        files,
        plural(files)
    )
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// One line per repository: name, checked-out branch and whether it is dirty.
///
/// The branch is green when it is the release branch and blue otherwise.
pub fn format_repo_status(name: &str, branch: &str, release_branch: &str, dirty: bool) -> String {
    let branch = if branch == release_branch {
        style(branch).green()
    } else {
        style(branch).blue()
    };
    let mut line = format!("{} ({})", style(name).bold(), branch);
    if dirty {
        line.push_str(&format!(" {}", style("dirty").red()));
    }
    line
}

/// What will be shipped for one repository
#[derive(Debug, Clone, PartialEq)]
pub struct ShipSummary {
    pub repo: String,
    pub tag: String,
    /// Where the tag will be pushed; the GitHub `owner/repo` when no URL is known
    pub destination: String,
    pub is_rc: bool,
    pub release_notes: String,
}

/// Everything shown before asking for confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PlanPreview {
    pub operations: usize,
    pub files: Vec<PathBuf>,
    pub repos: usize,
    /// In the order repositories will be committed and pushed
    pub ships: Vec<ShipSummary>,
}

impl PlanPreview {
    /// Whether at least one repository ships a full release
    pub fn releases_anything(&self) -> bool {
        self.ships.iter().any(|s| !s.is_rc)
    }
}

/// Format the plan summary: counts, touched files, and what gets pushed where.
///
/// # Arguments
/// * `preview` - Planned operations and shipping summaries
///
/// # Returns
/// Multi-line text ready to print
pub fn format_plan(preview: &PlanPreview) -> String {
    let mut out = format!(
        "{} operations, {} files touched, {} repos touched\n",
        preview.operations,
        preview.files.len(),
        preview.repos
    );
    for file in &preview.files {
        out.push_str(&format!("    {}\n", file.display()));
    }
    out.push('\n');

    for ship in &preview.ships {
        out.push_str(&format!(
            "push {} --> {}\n",
            style(&ship.tag).blue(),
            ship.destination
        ));
        if !ship.is_rc {
            out.push_str(&format!("{}\n", style("release notes:").green()));
            out.push_str(&ship.release_notes);
            out.push_str("\n\n");
        }
    }
    out
}

pub fn display_plan(preview: &PlanPreview) {
    print!("{}", format_plan(preview));
}

/// Print the line for a finished commit
pub fn display_commit(module: &str, commit: &str) {
    println!("commit {} ({})", style(module).green(), commit);
}

/// Print the closing line of a run
pub fn display_shipped(released: bool) {
    if released {
        println!("{}🚀", style("shipped release").green());
    } else {
        println!("{}🚚", style("shipped candidate").green());
    }
}

pub fn display_cancelled() {
    println!("don't ship it! 🚚🚓");
}
