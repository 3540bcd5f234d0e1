//! Request-scoped context handed to every helper phase.
//!
//! The context is read-only for helpers: environment paths, an optional
//! workspace handle, and a hierarchical reporter. Helper-owned data travels in
//! the helper's state payload, never here.

use crate::error::ReadinessError;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Paths and flags describing where the command runs.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub cwd: PathBuf,
    pub project_root: PathBuf,
    pub workspace_root: Option<PathBuf>,
    pub flags: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new(cwd: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            project_root: project_root.into(),
            workspace_root: None,
            flags: BTreeMap::new(),
        }
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: Value) -> Self {
        self.flags.insert(name.into(), value);
        self
    }
}

/// Handle to the workspace a command operates on.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub async fn exists(&self, relative: impl AsRef<Path>) -> Result<bool, ReadinessError> {
        Ok(tokio::fs::try_exists(self.resolve(relative)).await?)
    }

    /// Remove a file or directory tree; a missing target is not an error.
    pub async fn remove(&self, relative: impl AsRef<Path>) -> Result<(), ReadinessError> {
        let target = self.resolve(relative);
        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await?;
        } else {
            tokio::fs::remove_file(&target).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A single structured log line emitted through a [`Reporter`].
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    pub namespace: String,
    pub level: ReportLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

/// Destination for reporter records.
pub trait ReportSink: Send + Sync {
    fn record(&self, record: ReportRecord);
}

/// Forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn record(&self, record: ReportRecord) {
        let fields = record
            .fields
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_default();
        match record.level {
            ReportLevel::Debug => {
                debug!(namespace = %record.namespace, fields = %fields, "{}", record.message)
            }
            ReportLevel::Info => {
                info!(namespace = %record.namespace, fields = %fields, "{}", record.message)
            }
            ReportLevel::Warn => {
                warn!(namespace = %record.namespace, fields = %fields, "{}", record.message)
            }
            ReportLevel::Error => {
                error!(namespace = %record.namespace, fields = %fields, "{}", record.message)
            }
        }
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ReportRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().clone()
    }

    pub fn records_for(&self, namespace: &str) -> Vec<ReportRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.namespace == namespace)
            .cloned()
            .collect()
    }
}

impl ReportSink for MemorySink {
    fn record(&self, record: ReportRecord) {
        self.records.lock().push(record);
    }
}

/// Hierarchical logger; `child` scopes lines to a helper or phase.
#[derive(Clone)]
pub struct Reporter {
    namespace: String,
    sink: Arc<dyn ReportSink>,
}

impl Reporter {
    pub fn new(namespace: impl Into<String>, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            namespace: namespace.into(),
            sink,
        }
    }

    pub fn tracing(namespace: impl Into<String>) -> Self {
        Self::new(namespace, Arc::new(TracingSink))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn child(&self, name: &str) -> Reporter {
        let namespace = if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        };
        Reporter {
            namespace,
            sink: Arc::clone(&self.sink),
        }
    }

    pub fn log(&self, level: ReportLevel, message: impl Into<String>, fields: Option<Value>) {
        self.sink.record(ReportRecord {
            namespace: self.namespace.clone(),
            level,
            message: message.into(),
            fields,
        });
    }

    pub fn debug(&self, message: impl Into<String>, fields: Option<Value>) {
        self.log(ReportLevel::Debug, message, fields);
    }

    pub fn info(&self, message: impl Into<String>, fields: Option<Value>) {
        self.log(ReportLevel::Info, message, fields);
    }

    pub fn warn(&self, message: impl Into<String>, fields: Option<Value>) {
        self.log(ReportLevel::Warn, message, fields);
    }

    pub fn error(&self, message: impl Into<String>, fields: Option<Value>) {
        self.log(ReportLevel::Error, message, fields);
    }
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Everything a helper phase may read.
#[derive(Debug, Clone)]
pub struct Context {
    pub reporter: Reporter,
    pub workspace: Option<Workspace>,
    pub environment: Environment,
}

impl Context {
    pub fn new(reporter: Reporter, workspace: Option<Workspace>, environment: Environment) -> Self {
        Self {
            reporter,
            workspace,
            environment,
        }
    }
}
