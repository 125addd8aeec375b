//! Main workflow orchestration logic
//!
//! Loads the workspace, plans the bump, shows the preview, and once confirmed
//! writes the files, then commits, tags, pushes and drafts a release for every
//! repository in the order it first appears in the plan.
//!
//! Git handles, the release publisher and the answer source are all passed
//! in, so the whole flow runs against mocks in tests.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::config::{Config, RepositorySettings};
use crate::domain::BumpKind;
use crate::git::Repository;
use crate::github::{ReleasePublisher, ReleaseRequest};
use crate::plan::plan_bump;
use crate::ui::{self, PlanPreview, ShipSummary};
use crate::workspace::{RepositoryState, Workspace};

/// Arguments for the bump workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct BumpArgs {
    /// Repository to bump
    pub name: String,

    pub kind: BumpKind,

    /// Also bump repositories that pin the target
    pub propagate: bool,

    /// Preview only - write nothing
    pub dry_run: bool,

    /// Skip confirmation prompts
    pub assume_yes: bool,

    /// Git remote branches and tags are pushed to
    pub remote: String,
}

/// A repository that was committed, tagged and pushed
#[derive(Debug, Clone, PartialEq)]
pub struct ShippedRepo {
    pub repo: String,
    pub tag: String,
    pub commit: String,
    pub release_url: String,
}

/// How a bump workflow ended
#[derive(Debug, Clone, PartialEq)]
pub enum BumpOutcome {
    /// `--dry-run`: the plan was shown and nothing was written
    DryRun(PlanPreview),
    /// The user declined at a prompt
    Cancelled(PlanPreview),
    Shipped {
        preview: PlanPreview,
        repos: Vec<ShippedRepo>,
    },
}

/// Open every configured repository with `open`, keyed by name
pub fn open_repositories<R, O>(config: &Config, mut open: O) -> Result<BTreeMap<String, R>>
where
    O: FnMut(&Path) -> crate::Result<R>,
{
    config
        .repositories
        .iter()
        .map(|settings| {
            let directory = settings.directory();
            let repo = open(&directory)
                .with_context(|| format!("Failed to open repository {}", directory.display()))?;
            Ok((settings.name.clone(), repo))
        })
        .collect()
}

/// Main bump workflow
///
/// Orchestrates the entire release:
/// 1. Load every repository into a workspace and report its state
/// 2. Plan the bump (and its propagation)
/// 3. Preview and confirm
/// 4. Execute the planned file edits
/// 5. Commit, tag, push and draft a release per repository
///
/// # Arguments
///
/// * `args` - Workflow arguments
/// * `config` - Repositories and their dependencies
/// * `handles` - An open git repository per configured name
/// * `publisher` - Called once, after confirmation, to get the release publisher
/// * `input` - Where prompt answers are read from
///
/// # Returns
///
/// How the run ended, with the preview that was shown
pub fn run_bump<R, P, F, B>(
    args: &BumpArgs,
    config: &Config,
    handles: &BTreeMap<String, R>,
    publisher: F,
    input: &mut B,
) -> Result<BumpOutcome>
where
    R: Repository,
    P: ReleasePublisher,
    F: FnOnce() -> crate::Result<P>,
    B: BufRead,
{
    let mut workspace = Workspace::load(config, |settings: &RepositorySettings| {
        handle_for(handles, &settings.name)
    })
    .context("Failed to load repositories")?;

    for state in workspace.iter() {
        println!(
            "{}",
            ui::format_repo_status(&state.name, &state.branch, &state.release_branch, state.dirty)
        );
        for warning in state.warnings() {
            ui::display_boundary_warning(&warning);
        }
    }

    let mut plan = plan_bump(&mut workspace, &args.name, args.kind, args.propagate)
        .with_context(|| format!("Failed to plan bump of {}", args.name))?;

    let sequence = plan.repo_sequence();
    let mut ships = Vec::with_capacity(sequence.len());
    for name in &sequence {
        let state = workspace.get(name)?;
        ships.push(ship_summary(state, handle_for(handles, name)?, &args.remote)?);
    }
    let preview = PlanPreview {
        operations: plan.len(),
        files: plan.files_touched().into_iter().collect(),
        repos: plan.repos_touched().len(),
        ships,
    };
    ui::display_plan(&preview);

    if args.dry_run {
        ui::display_status("Dry run: nothing was written");
        return Ok(BumpOutcome::DryRun(preview));
    }

    if !args.assume_yes {
        if !ui::confirm_plan(input)? {
            ui::display_cancelled();
            return Ok(BumpOutcome::Cancelled(preview));
        }
        if preview.releases_anything() && !ui::confirm_ship_it(input)? {
            ui::display_cancelled();
            return Ok(BumpOutcome::Cancelled(preview));
        }
    }

    let publisher = publisher().context("Failed to set up GitHub access")?;

    let executed = plan
        .run(&mut workspace)
        .context("Failed to write planned changes")?;
    info!("executed {} operations", executed);
    ui::display_success(&ui::format_written(executed, preview.files.len()));

    let mut shipped = Vec::with_capacity(preview.ships.len());
    for ship in &preview.ships {
        let state = workspace.get(&ship.repo)?;
        let vcs = handle_for(handles, &ship.repo)?;
        let result = ship_repository(state, vcs, &publisher, ship, &args.remote)
            .with_context(|| format!("Failed to ship {}", ship.repo))?;
        ui::display_commit(&state.module, &result.commit);
        shipped.push(result);
    }

    ui::display_shipped(preview.releases_anything());
    Ok(BumpOutcome::Shipped {
        preview,
        repos: shipped,
    })
}

fn handle_for<'a, R>(handles: &'a BTreeMap<String, R>, name: &str) -> crate::Result<&'a R> {
    handles
        .get(name)
        .ok_or_else(|| crate::ReleaseError::UnknownRepository(name.to_string()))
}

fn ship_summary<R: Repository>(
    state: &RepositoryState,
    vcs: &R,
    remote: &str,
) -> Result<ShipSummary> {
    let version = state
        .new_version()
        .ok_or_else(|| anyhow!("{} has no new version", state.name))?;
    let destination = vcs
        .remote_url(remote)?
        .unwrap_or_else(|| state.remote.clone());
    Ok(ShipSummary {
        repo: state.name.clone(),
        tag: version.tag(),
        destination,
        is_rc: state.is_rc(),
        release_notes: state.release_message()?,
    })
}

fn ship_repository<R: Repository, P: ReleasePublisher>(
    state: &RepositoryState,
    vcs: &R,
    publisher: &P,
    ship: &ShipSummary,
    remote: &str,
) -> Result<ShippedRepo> {
    let version = state
        .new_version()
        .ok_or_else(|| anyhow!("{} has no new version", state.name))?;

    let files = relative_paths(&state.directory, state.files_to_commit());
    let message = format!("Bump version {} --> {}", state.current_version, version);
    let commit = vcs.commit_paths(&files, &message)?;

    vcs.create_tag(&ship.tag, &ship.tag)?;
    vcs.push(
        remote,
        &[
            format!("refs/heads/{}", state.branch),
            format!("refs/tags/{}", ship.tag),
        ],
    )?;

    let request = ReleaseRequest::draft(&ship.tag, &ship.release_notes, ship.is_rc);
    let release_url = publisher.create_release(&state.remote, &request)?;

    Ok(ShippedRepo {
        repo: state.name.clone(),
        tag: ship.tag.clone(),
        commit,
        release_url,
    })
}

fn relative_paths(root: &Path, files: Vec<PathBuf>) -> Vec<PathBuf> {
    files
        .into_iter()
        .map(|f| f.strip_prefix(root).map(Path::to_path_buf).unwrap_or(f))
        .collect()
}
