//! `git` helper: ensures the workspace is a git repository.

use crate::context::{Context, Workspace};
use crate::error::ReadinessError;
use crate::helpers::command::{run_checked, CommandRunner};
use crate::readiness::{
    Cleanup, Confirmation, Detection, HelperMetadata, HelperPhases, ReadinessHelper, StepResult,
};
use async_trait::async_trait;
use std::sync::Arc;

pub const GIT_KEY: &str = "git";

#[derive(Debug, Clone)]
pub struct GitState {
    pub workspace: Option<Workspace>,
}

pub struct GitRepositoryHelper {
    runner: Arc<dyn CommandRunner>,
}

impl GitRepositoryHelper {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ReadinessHelper for GitRepositoryHelper {
    type State = GitState;

    fn key(&self) -> &str {
        GIT_KEY
    }

    fn metadata(&self) -> HelperMetadata {
        HelperMetadata::new("Git repository")
            .with_description("Initialises a git repository when the workspace has none.")
            .with_tags(["vcs"])
            .with_scopes(["doctor", "init", "create"])
            .with_order(10)
    }

    fn phases(&self) -> HelperPhases {
        HelperPhases::default().with_execute()
    }

    async fn detect(&self, context: &Context) -> Result<Detection<GitState>, ReadinessError> {
        let Some(workspace) = context.workspace.clone() else {
            return Ok(Detection::blocked(GitState {
                workspace: None,
            })
            .with_message("Workspace not resolved; git init unavailable."));
        };

        if workspace.exists(".git").await? {
            return Ok(Detection::ready(GitState {
                workspace: Some(workspace),
            })
            .with_message("Git repository detected."));
        }

        Ok(Detection::pending(GitState {
            workspace: Some(workspace),
        })
        .with_message("Initialise git repository."))
    }

    async fn execute(
        &self,
        _context: &Context,
        state: &GitState,
    ) -> Result<StepResult<GitState>, ReadinessError> {
        let Some(workspace) = state.workspace.clone() else {
            return Ok(StepResult::new(state.clone()));
        };

        run_checked(self.runner.as_ref(), "git", &["init"], workspace.root()).await?;

        let target = workspace.clone();
        Ok(StepResult::new(GitState {
            workspace: Some(workspace),
        })
        .with_cleanup(
            Cleanup::new(move || async move { target.remove(".git").await })
                .labelled("remove .git"),
        ))
    }

    async fn confirm(
        &self,
        _context: &Context,
        state: &GitState,
    ) -> Result<Confirmation<GitState>, ReadinessError> {
        let exists = match &state.workspace {
            Some(workspace) => workspace.exists(".git").await?,
            None => false,
        };
        let confirmation = if exists {
            Confirmation::ready(state.clone()).with_message("Git repository ready.")
        } else {
            Confirmation::pending(state.clone()).with_message("Git repository missing.")
        };
        Ok(confirmation)
    }
}
