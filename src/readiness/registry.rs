//! Readiness registry: keyed helpers and plan construction.

use crate::context::Context;
use crate::error::ReadinessError;
use crate::readiness::helper::{DynHelper, HelperPhases, ReadinessHelper};
use crate::readiness::runner::run_plan;
use crate::readiness::types::{HelperMetadata, ReadinessKey, RunResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

struct RegisteredHelper {
    helper: Arc<dyn DynHelper>,
    order: Option<i64>,
    index: usize,
}

/// Key and metadata of a registered helper.
#[derive(Debug, Clone, Serialize)]
pub struct HelperDescriptor {
    pub key: ReadinessKey,
    pub metadata: HelperMetadata,
    pub phases: HelperPhases,
}

/// Holds helpers by key. Built once per command invocation.
#[derive(Default)]
pub struct ReadinessRegistry {
    helpers: HashMap<ReadinessKey, RegisteredHelper>,
}

impl ReadinessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a helper. A key can be registered once; the first registration is kept.
    pub fn register<H: ReadinessHelper>(&mut self, helper: H) -> Result<(), ReadinessError> {
        let key = ReadinessKey::from(ReadinessHelper::key(&helper));
        if self.helpers.contains_key(&key) {
            return Err(ReadinessError::developer(format!(
                "Readiness helper already registered for {}.",
                key
            )));
        }
        let order = ReadinessHelper::metadata(&helper).order;
        let entry = RegisteredHelper {
            helper: Arc::new(helper),
            order,
            index: self.helpers.len(),
        };
        self.helpers.insert(key, entry);
        Ok(())
    }

    /// Resolve `keys` in the given order into a runnable plan.
    ///
    /// Each key may appear once, so every helper yields exactly one outcome per run.
    pub fn plan<K: AsRef<str>>(&self, keys: &[K]) -> Result<ReadinessPlan, ReadinessError> {
        let mut resolved_keys = Vec::with_capacity(keys.len());
        let mut helpers = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let entry = self.helpers.get(key).ok_or_else(|| {
                ReadinessError::developer(format!("Unknown readiness helper: {}.", key))
            })?;
            if resolved_keys.iter().any(|k: &ReadinessKey| k.as_str() == key) {
                return Err(ReadinessError::developer(format!(
                    "Readiness helper listed more than once in plan: {}.",
                    key
                )));
            }
            resolved_keys.push(ReadinessKey::from(key));
            helpers.push(Arc::clone(&entry.helper));
        }
        Ok(ReadinessPlan {
            keys: resolved_keys,
            helpers,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.helpers.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Descriptors sorted by metadata order, then registration order.
    pub fn describe(&self) -> Vec<HelperDescriptor> {
        self.sorted()
            .into_iter()
            .map(|entry| HelperDescriptor {
                key: ReadinessKey::from(entry.helper.key()),
                metadata: entry.helper.metadata(),
                phases: entry.helper.phases(),
            })
            .collect()
    }

    pub fn keys(&self) -> Vec<ReadinessKey> {
        self.sorted()
            .into_iter()
            .map(|entry| ReadinessKey::from(entry.helper.key()))
            .collect()
    }

    pub fn keys_for_scope(&self, scope: &str) -> Vec<ReadinessKey> {
        self.sorted()
            .into_iter()
            .filter(|entry| entry.helper.metadata().in_scope(scope))
            .map(|entry| ReadinessKey::from(entry.helper.key()))
            .collect()
    }

    fn sorted(&self) -> Vec<&RegisteredHelper> {
        let mut entries: Vec<&RegisteredHelper> = self.helpers.values().collect();
        entries.sort_by_key(|entry| (entry.order.is_none(), entry.order, entry.index));
        entries
    }
}

/// Resolved, ordered helpers. Stateless; every `run` starts fresh.
#[derive(Clone)]
pub struct ReadinessPlan {
    keys: Vec<ReadinessKey>,
    helpers: Vec<Arc<dyn DynHelper>>,
}

impl ReadinessPlan {
    pub fn keys(&self) -> &[ReadinessKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub async fn run(&self, context: &Context) -> RunResult {
        run_plan(context, &self.helpers).await
    }
}

impl std::fmt::Debug for ReadinessPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessPlan")
            .field("keys", &self.keys)
            .finish()
    }
}
