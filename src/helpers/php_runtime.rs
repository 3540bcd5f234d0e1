//! `php-runtime` helper: detection only, PHP must resolve on PATH.

use crate::context::Context;
use crate::error::ReadinessError;
use crate::helpers::command::find_on_path;
use crate::readiness::{Confirmation, Detection, HelperMetadata, ReadinessHelper};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;

pub const PHP_RUNTIME_KEY: &str = "php-runtime";

pub struct PhpRuntimeHelper {
    binary: String,
    path_override: Option<OsString>,
}

impl PhpRuntimeHelper {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            path_override: None,
        }
    }

    /// Search `path` instead of the process `PATH`.
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.path_override = Some(path.into());
        self
    }

    fn resolve(&self) -> Option<PathBuf> {
        match &self.path_override {
            Some(path) => find_on_path(&self.binary, Some(path.as_os_str())),
            None => {
                let path = std::env::var_os("PATH");
                find_on_path(&self.binary, path.as_deref())
            }
        }
    }
}

#[async_trait]
impl ReadinessHelper for PhpRuntimeHelper {
    type State = Option<PathBuf>;

    fn key(&self) -> &str {
        PHP_RUNTIME_KEY
    }

    fn metadata(&self) -> HelperMetadata {
        HelperMetadata::new("PHP runtime")
            .with_description("Checks that a PHP binary resolves on PATH.")
            .with_tags(["php", "runtime"])
            .with_scopes(["doctor"])
            .with_order(30)
    }

    async fn detect(
        &self,
        _context: &Context,
    ) -> Result<Detection<Option<PathBuf>>, ReadinessError> {
        match self.resolve() {
            Some(path) => {
                let message = format!("PHP binary found at {}.", path.display());
                Ok(Detection::ready(Some(path)).with_message(message))
            }
            None => Ok(Detection::blocked(None)
                .with_message(format!("`{}` not found on PATH.", self.binary))),
        }
    }

    async fn confirm(
        &self,
        _context: &Context,
        state: &Option<PathBuf>,
    ) -> Result<Confirmation<Option<PathBuf>>, ReadinessError> {
        match state {
            Some(path) if path.is_file() => Ok(Confirmation::ready(state.clone())
                .with_message(format!("PHP binary available at {}.", path.display()))),
            _ => Ok(Confirmation::pending(state.clone()).with_message("PHP binary unavailable.")),
        }
    }
}
