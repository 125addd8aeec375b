//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_cancelled, display_commit, display_error, display_plan,
    display_shipped, display_status, display_success, format_plan, format_repo_status,
    format_written, PlanPreview, ShipSummary,
};

/// Keep asking `prompt` until one of `accepted` (case-insensitive) is entered.
///
/// # Arguments
/// * `input` - Where answers are read from
/// * `prompt` - Text printed before each read
/// * `accepted` - Lowercase answers that end the loop
///
/// # Returns
/// * `Ok(String)` - The accepted answer, lowercased
/// * `Err` - If input ends before an accepted answer is given
pub fn ask_until<R: BufRead>(input: &mut R, prompt: &str, accepted: &[&str]) -> Result<String> {
    loop {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("No answer given");
        }
        let answer = line.trim().to_lowercase();
        if accepted.contains(&answer.as_str()) {
            return Ok(answer);
        }
    }
}

/// Ask "look good? y/n" until the user answers.
///
/// # Returns
/// * `Ok(true)` - If user entered "y" or "yes"
/// * `Ok(false)` - If user entered "n" or "no"
pub fn confirm_plan<R: BufRead>(input: &mut R) -> Result<bool> {
    let answer = ask_until(input, "look good? y/n: ", &["y", "yes", "n", "no"])?;
    Ok(answer.starts_with('y'))
}

/// Second confirmation before pushing a full release.
///
/// # Returns
/// * `Ok(true)` - If user typed "ship it"
/// * `Ok(false)` - If user typed "quit"
pub fn confirm_ship_it<R: BufRead>(input: &mut R) -> Result<bool> {
    let answer = ask_until(
        input,
        "this will push a release... is this what you mean to do?\n\
         type \"ship it\" or \"quit\"...\n",
        &["ship it", "quit"],
    )?;
    Ok(answer == "ship it")
}
