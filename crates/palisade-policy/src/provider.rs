//! Policy providers and the registry that compiles their output.
//!
//! A provider yields a list of policy definitions from somewhere (a file, a
//! remote endpoint, a static set). The registry aggregates every registered
//! provider's policies, compiles them into a snapshot, and publishes it: the
//! current snapshot is always readable through a lock-free pointer, and a
//! recompile callback lets the hosting processor mirror it into its own
//! atomic slot.
//!
//! A failed load or compile leaves the previous snapshot active; telemetry
//! must not be lost to a malformed policy.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;

use crate::def::PolicyDef;
use crate::error::ProviderError;
use crate::snapshot::{compile, PolicySnapshot};

/// A source of policy definitions.
pub trait PolicyProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Produce the current policy list.
    fn load(&self) -> Result<Vec<PolicyDef>, ProviderError>;
}

/// Callback invoked with each newly compiled snapshot.
pub type RecompileCallback = Box<dyn Fn(&Arc<PolicySnapshot>) + Send + Sync>;

/// Aggregates providers and publishes compiled snapshots.
pub struct PolicyRegistry {
    providers: Mutex<Vec<Arc<dyn PolicyProvider>>>,
    snapshot: ArcSwap<PolicySnapshot>,
    on_recompile: Mutex<Option<RecompileCallback>>,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyRegistry {
    /// Create a registry with an empty active snapshot.
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(Vec::new()),
            snapshot: ArcSwap::from_pointee(PolicySnapshot::default()),
            on_recompile: Mutex::new(None),
        }
    }

    /// Set the callback fired after every successful recompile. The callback
    /// also fires immediately if a non-empty snapshot is already active.
    pub fn set_on_recompile(&self, callback: RecompileCallback) {
        let current = self.snapshot.load_full();
        if !current.is_empty() {
            callback(&current);
        }
        *self.on_recompile.lock().expect("callback lock poisoned") = Some(callback);
    }

    /// Register a provider and reload all policies.
    pub fn register(&self, provider: Arc<dyn PolicyProvider>) -> Result<(), ProviderError> {
        self.providers
            .lock()
            .expect("provider lock poisoned")
            .push(provider);
        self.reload()
    }

    /// Re-read every provider, recompile, and publish the result.
    ///
    /// On any error the previous snapshot remains active.
    pub fn reload(&self) -> Result<(), ProviderError> {
        let providers = self
            .providers
            .lock()
            .expect("provider lock poisoned")
            .clone();

        let mut defs: Vec<PolicyDef> = Vec::new();
        for provider in &providers {
            let mut loaded = provider.load()?;
            tracing::debug!(
                provider = provider.name(),
                count = loaded.len(),
                "loaded policies"
            );
            defs.append(&mut loaded);
        }

        let snapshot = Arc::new(compile(&defs)?);
        tracing::info!(
            policies = snapshot.len(),
            providers = providers.len(),
            "policies recompiled"
        );

        self.snapshot.store(Arc::clone(&snapshot));
        if let Some(callback) = self.on_recompile.lock().expect("callback lock poisoned").as_ref() {
            callback(&snapshot);
        }
        Ok(())
    }

    /// The currently active snapshot (lock-free load).
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.snapshot.load_full()
    }
}

/// A fixed, in-memory policy set; useful for tests and static configuration.
pub struct StaticProvider {
    policies: Vec<PolicyDef>,
}

impl StaticProvider {
    pub fn new(policies: Vec<PolicyDef>) -> Self {
        Self { policies }
    }
}

impl PolicyProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self) -> Result<Vec<PolicyDef>, ProviderError> {
        Ok(self.policies.clone())
    }
}
