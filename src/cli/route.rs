//! CLI route: single route table and run context.

use crate::cli::help::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_ensure_summary, format_list_json, format_list_text};
use crate::config::{ConfigLoader, DxReadyConfig};
use crate::context::{Context, Environment, Reporter, Workspace};
use crate::doctor::{build_report, format_report_json, format_report_text, DoctorMapper};
use crate::error::ReadinessError;
use crate::helpers::{default_registry, TokioCommandRunner};
use crate::readiness::{assert_ready, ReadinessRegistry, RunResult};
use serde_json::json;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Text to print and whether the process should exit successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandReport {
    pub output: String,
    pub success: bool,
}

impl CommandReport {
    fn ok(output: String) -> Self {
        Self {
            output,
            success: true,
        }
    }
}

/// Runtime context for CLI execution: workspace, config, and the helper registry.
pub struct RunContext {
    workspace_root: PathBuf,
    config: DxReadyConfig,
    registry: ReadinessRegistry,
    mapper: DoctorMapper,
    reporter: Reporter,
}

impl RunContext {
    /// Load configuration for `workspace_root` and register the built-in helpers.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ReadinessError> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = config_path {
            loader = loader.with_explicit_file(path);
        }
        let config = loader.load(&workspace_root)?;
        let registry = default_registry(&config.readiness, Arc::new(TokioCommandRunner))?;
        Self::with_registry(workspace_root, config, registry)
    }

    /// Build from an already loaded config and registry.
    pub fn with_registry(
        workspace_root: PathBuf,
        config: DxReadyConfig,
        registry: ReadinessRegistry,
    ) -> Result<Self, ReadinessError> {
        let mapper = DoctorMapper::from_config(&config.doctor)?;
        let workspace_root = workspace_root.canonicalize().unwrap_or(workspace_root);
        Ok(Self {
            workspace_root,
            config,
            registry,
            mapper,
            reporter: Reporter::tracing("dxready"),
        })
    }

    /// Send helper reports to `reporter` instead of `tracing`.
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &DxReadyConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReadinessRegistry {
        &self.registry
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandReport, ReadinessError> {
        let started = Instant::now();
        let name = command_name(command);
        let result = match command {
            Commands::Doctor {
                keys,
                format,
                no_color,
            } => self.handle_doctor(keys, format, !no_color).await,
            Commands::Ensure { keys } => self.handle_ensure(keys).await,
            Commands::List { format, scope } => self.handle_list(format, scope.as_deref()),
            Commands::Config => self.config.to_toml().map(CommandReport::ok),
        };
        info!(
            command = name,
            ok = result.as_ref().map(|r| r.success).unwrap_or(false),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn build_context(&self, command: &str) -> Result<Context, ReadinessError> {
        let cwd = std::env::current_dir()?;
        let workspace = self
            .workspace_root
            .is_dir()
            .then(|| Workspace::new(&self.workspace_root));
        let environment = Environment::new(cwd, &self.workspace_root)
            .with_workspace_root(&self.workspace_root)
            .with_flag("command", json!(command));
        Ok(Context::new(
            self.reporter.child(command),
            workspace,
            environment,
        ))
    }

    async fn run_keys(
        &self,
        command: &str,
        keys: &[String],
        defaults: &[String],
    ) -> Result<RunResult, ReadinessError> {
        let keys = if keys.is_empty() { defaults } else { keys };
        let plan = self.registry.plan(keys)?;
        let context = self.build_context(command)?;
        Ok(plan.run(&context).await)
    }

    async fn handle_doctor(
        &self,
        keys: &[String],
        format: &str,
        color: bool,
    ) -> Result<CommandReport, ReadinessError> {
        let result = self
            .run_keys("doctor", keys, &self.config.readiness.doctor_keys)
            .await?;
        let report = build_report(&result, &self.registry.describe(), &self.mapper);
        let output = match format {
            "json" => format_report_json(&report)?,
            "text" => format_report_text(&report, color && std::io::stdout().is_terminal()),
            other => return Err(invalid_format(other)),
        };
        Ok(CommandReport {
            output,
            success: !report.has_failures(),
        })
    }

    async fn handle_ensure(&self, keys: &[String]) -> Result<CommandReport, ReadinessError> {
        let result = self
            .run_keys("ensure", keys, &self.config.readiness.ensure_keys)
            .await?;
        assert_ready(&result)?;
        Ok(CommandReport::ok(format_ensure_summary(&result)))
    }

    fn handle_list(&self, format: &str, scope: Option<&str>) -> Result<CommandReport, ReadinessError> {
        let descriptors: Vec<_> = self
            .registry
            .describe()
            .into_iter()
            .filter(|d| scope.map_or(true, |s| d.metadata.in_scope(s)))
            .collect();
        let output = match format {
            "json" => format_list_json(&descriptors)?,
            "text" => format_list_text(&descriptors),
            other => return Err(invalid_format(other)),
        };
        Ok(CommandReport::ok(output))
    }
}

fn invalid_format(format: &str) -> ReadinessError {
    ReadinessError::Config(format!(
        "Invalid output format: {} (must be 'text' or 'json')",
        format
    ))
}
