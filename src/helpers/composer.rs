//! `composer` helper: installs PHP dependencies when the autoloader is missing.
//!
//! `prepare` notes whether `vendor/` already existed so the cleanup registered
//! by `execute` only removes a directory this run created.

use crate::context::{Context, Workspace};
use crate::error::ReadinessError;
use crate::helpers::command::{run_checked, CommandRunner};
use crate::readiness::{
    Cleanup, Confirmation, Detection, HelperMetadata, HelperPhases, ReadinessHelper, StepResult,
};
use async_trait::async_trait;
use std::sync::Arc;

pub const COMPOSER_KEY: &str = "composer";

const AUTOLOAD: &str = "vendor/autoload.php";
const VENDOR: &str = "vendor";

#[derive(Debug, Clone)]
pub struct ComposerState {
    pub workspace: Option<Workspace>,
    pub vendor_previously_existed: bool,
}

pub struct ComposerHelper {
    runner: Arc<dyn CommandRunner>,
    install_on_pending: bool,
}

impl ComposerHelper {
    pub fn new(runner: Arc<dyn CommandRunner>, install_on_pending: bool) -> Self {
        Self {
            runner,
            install_on_pending,
        }
    }
}

#[async_trait]
impl ReadinessHelper for ComposerHelper {
    type State = ComposerState;

    fn key(&self) -> &str {
        COMPOSER_KEY
    }

    fn metadata(&self) -> HelperMetadata {
        HelperMetadata::new("Composer dependencies")
            .with_description("Ensures vendor/autoload.php exists, running composer install if needed.")
            .with_tags(["php", "dependencies"])
            .with_scopes(["doctor", "init"])
            .with_order(20)
    }

    fn phases(&self) -> HelperPhases {
        if self.install_on_pending {
            HelperPhases::default().with_prepare().with_execute()
        } else {
            HelperPhases::CHECK_ONLY
        }
    }

    async fn detect(&self, context: &Context) -> Result<Detection<ComposerState>, ReadinessError> {
        let Some(workspace) = context.workspace.clone() else {
            return Ok(Detection::blocked(ComposerState {
                workspace: None,
                vendor_previously_existed: false,
            })
            .with_message("Workspace not resolved; composer install unavailable."));
        };

        if !workspace.exists("composer.json").await? {
            return Ok(Detection::blocked(ComposerState {
                workspace: Some(workspace),
                vendor_previously_existed: false,
            })
            .with_message("composer.json missing. Run composer init or add manifest."));
        }

        let has_autoload = workspace.exists(AUTOLOAD).await?;
        let state = ComposerState {
            workspace: Some(workspace),
            vendor_previously_existed: has_autoload,
        };
        if has_autoload {
            return Ok(Detection::ready(state).with_message("Composer autoload detected."));
        }
        Ok(Detection::pending(state).with_message("Install composer dependencies."))
    }

    async fn prepare(
        &self,
        _context: &Context,
        state: &ComposerState,
    ) -> Result<StepResult<ComposerState>, ReadinessError> {
        let vendor_previously_existed = match &state.workspace {
            Some(workspace) => workspace.exists(VENDOR).await?,
            None => false,
        };
        Ok(StepResult::new(ComposerState {
            workspace: state.workspace.clone(),
            vendor_previously_existed,
        }))
    }

    async fn execute(
        &self,
        _context: &Context,
        state: &ComposerState,
    ) -> Result<StepResult<ComposerState>, ReadinessError> {
        let Some(workspace) = state.workspace.clone() else {
            return Ok(StepResult::new(state.clone()));
        };

        run_checked(
            self.runner.as_ref(),
            "composer",
            &["install", "--no-interaction"],
            workspace.root(),
        )
        .await?;

        let step = StepResult::new(state.clone());
        if state.vendor_previously_existed {
            return Ok(step);
        }
        Ok(step.with_cleanup(
            Cleanup::new(move || async move { workspace.remove(VENDOR).await })
                .labelled("remove vendor"),
        ))
    }

    async fn confirm(
        &self,
        _context: &Context,
        state: &ComposerState,
    ) -> Result<Confirmation<ComposerState>, ReadinessError> {
        let exists = match &state.workspace {
            Some(workspace) => workspace.exists(AUTOLOAD).await?,
            None => false,
        };
        let confirmation = if exists {
            Confirmation::ready(state.clone()).with_message("Composer autoload ready.")
        } else {
            Confirmation::pending(state.clone()).with_message("Composer autoload missing.")
        };
        Ok(confirmation)
    }
}
