//! Cascading bump planner.
//!
//! Bumping one repository decides its new version, then walks every
//! repository that pins it (and, transitively, their dependents) deciding
//! their versions too. Each decision becomes a set of [`FileEdit`]s in a
//! [`BumpPlan`]; nothing is written until the plan is executed.
//!
//! Within one dependent the queue order is version file, dependency pins, then
//! changelog. A repository reachable through several paths gets its version
//! decided on the first visit only; later visits only add pin edits and
//! changelog entries for the other dependency. Dependent changelogs are
//! released after the whole walk, so a release section always carries every
//! entry recorded for that repository.

use log::{debug, info};

use crate::domain::{BumpKind, Version};
use crate::error::{ReleaseError, Result};
use crate::plan::edit::{BumpPlan, FileEdit};
use crate::workspace::Workspace;

pub struct BumpPlanner<'a> {
    workspace: &'a mut Workspace,
}

impl<'a> BumpPlanner<'a> {
    pub fn new(workspace: &'a mut Workspace) -> Self {
        BumpPlanner { workspace }
    }

    /// Plan bumping `target` by `kind`, optionally propagating to dependents
    pub fn plan(&mut self, target: &str, kind: BumpKind, propagate: bool) -> Result<BumpPlan> {
        let state = self.workspace.get(target)?;
        let mut new_version = state.current_version;
        kind.apply(&mut new_version)?;

        state.ensure_tag_absent(&new_version)?;
        if new_version.is_release() && state.changelog().is_empty() {
            return Err(ReleaseError::EmptyChangelog(state.name.clone()));
        }
        info!(
            "bump {} from {} --> {}",
            state.name, state.current_version, new_version
        );

        let state = self.workspace.get_mut(target)?;
        state.set_new_version(new_version)?;

        let mut stack = BumpPlan::new();
        if new_version.is_release() {
            stack.push(
                state.changelog_file(),
                target,
                FileEdit::ReleaseChangelog {
                    version: new_version,
                },
            )?;
        }
        stack.push(
            state.version_file(),
            target,
            FileEdit::SetVersion {
                version: new_version,
            },
        )?;

        if propagate {
            self.propagate(target, kind.is_release(), &mut stack)?;
            self.release_dependent_changelogs(target, &mut stack)?;
        }
        Ok(stack)
    }

    fn release_dependent_changelogs(&self, target: &str, stack: &mut BumpPlan) -> Result<()> {
        for name in stack.repo_sequence() {
            if name == target {
                continue;
            }
            let state = self.workspace.get(&name)?;
            if let Some(version) = state.new_version().filter(|v| v.is_release()) {
                stack.push(
                    state.changelog_file(),
                    &name,
                    FileEdit::ReleaseChangelog { version: *version },
                )?;
            }
        }
        Ok(())
    }

    fn propagate(&mut self, bumped: &str, is_release: bool, stack: &mut BumpPlan) -> Result<()> {
        let bumped_state = self.workspace.get(bumped)?;
        let module = bumped_state.module.clone();
        let remote = bumped_state.remote.clone();
        let shipped = *bumped_state
            .new_version()
            .ok_or_else(|| ReleaseError::InvalidOperation(format!("{} was never bumped", bumped)))?;

        for dependent in self.workspace.dependents_of(&module) {
            let state = self.workspace.get(&dependent)?;
            let pinned = state.requirements.get(&module).ok_or_else(|| {
                ReleaseError::missing(format!("requirement for {}", module), state.setup_file())
            })?;
            if *pinned == shipped.to_string() {
                debug!("{} already requires {} {}", dependent, module, shipped);
                continue;
            }
            if state.has_requirements_file && !state.requirement_links.contains(&module) {
                return Err(ReleaseError::missing(
                    format!("requirement for {}", module),
                    state.requirements_file(),
                ));
            }

            let first_visit = state.new_version().is_none();
            let mut dependent_version = state.current_version;
            if first_visit {
                bump_dependent(&mut dependent_version, is_release)?;
                state.ensure_tag_absent(&dependent_version)?;
                info!(
                    "bump {} from {} --> {}",
                    dependent, state.current_version, dependent_version
                );
            }

            let state = self.workspace.get_mut(&dependent)?;
            if first_visit {
                state.set_new_version(dependent_version)?;
                stack.push(
                    state.version_file(),
                    &dependent,
                    FileEdit::SetVersion {
                        version: dependent_version,
                    },
                )?;
            }
            stack.push(
                state.setup_file(),
                &dependent,
                FileEdit::PinRequirement {
                    dependency: module.clone(),
                    version: shipped,
                },
            )?;
            if state.has_requirements_file {
                stack.push(
                    state.requirements_file(),
                    &dependent,
                    FileEdit::PinRequirementLink {
                        dependency: module.clone(),
                        version: shipped,
                        remote: remote.clone(),
                    },
                )?;
            }
            state
                .changelog_mut()
                .record_dependency_bump(&module, &shipped);

            if first_visit {
                self.propagate(&dependent, is_release, stack)?;
            }
        }
        Ok(())
    }
}

fn bump_dependent(version: &mut Version, is_release: bool) -> Result<()> {
    if is_release {
        version.bump_release(None)
    } else {
        version.bump_candidate(None)
    }
}

/// Plan a bump of `target` against `workspace`
pub fn plan_bump(
    workspace: &mut Workspace,
    target: &str,
    kind: BumpKind,
    propagate: bool,
) -> Result<BumpPlan> {
    BumpPlanner::new(workspace).plan(target, kind, propagate)
}
