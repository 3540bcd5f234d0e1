//! Built-in readiness helpers.

pub mod command;
pub mod composer;
pub mod git;
pub mod php_runtime;

pub use command::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use composer::{ComposerHelper, COMPOSER_KEY};
pub use git::{GitRepositoryHelper, GIT_KEY};
pub use php_runtime::{PhpRuntimeHelper, PHP_RUNTIME_KEY};

use crate::config::ReadinessConfig;
use crate::error::ReadinessError;
use crate::readiness::ReadinessRegistry;
use std::sync::Arc;

/// Registry with `git`, `composer` and `php-runtime` registered.
pub fn default_registry(
    settings: &ReadinessConfig,
    runner: Arc<dyn CommandRunner>,
) -> Result<ReadinessRegistry, ReadinessError> {
    let mut registry = ReadinessRegistry::new();
    registry.register(GitRepositoryHelper::new(Arc::clone(&runner)))?;
    registry.register(ComposerHelper::new(runner, settings.install_on_pending))?;
    registry.register(PhpRuntimeHelper::new(settings.php_binary.clone()))?;
    Ok(registry)
}
