//! File-backed policy provider.
//!
//! Reads a JSON policy file (`{"policies": [...]}`) and, through the watcher
//! task, polls it for changes on a configurable interval. A change triggers
//! a registry reload; load or compile failures are logged and leave the
//! previous snapshot active.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use palisade_policy::{PolicyDef, PolicyProvider, PolicyRegistry, ProviderError};

use crate::config::ProcessorConfig;
use crate::error::ProcessorError;
use crate::process::PolicyProcessor;

/// Wire container for a policy file.
#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default)]
    policies: Vec<PolicyDef>,
}

/// Loads policy definitions from a JSON file on disk.
pub struct FilePolicyProvider {
    path: PathBuf,
}

impl FilePolicyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PolicyProvider for FilePolicyProvider {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Vec<PolicyDef>, ProviderError> {
        let bytes = std::fs::read(&self.path).map_err(|err| ProviderError::Load {
            name: self.name().to_owned(),
            message: format!("{}: {err}", self.path.display()),
        })?;
        let file: PolicyFile =
            serde_json::from_slice(&bytes).map_err(|err| ProviderError::Load {
                name: self.name().to_owned(),
                message: format!("{}: {err}", self.path.display()),
            })?;
        Ok(file.policies)
    }
}

/// Wire up a processor from configuration: load the policy file, compile
/// the initial snapshot, and start the change watcher.
///
/// Fails if the configuration is incomplete or the initial policy set does
/// not load and compile; after startup, reload failures only log and keep
/// the previous snapshot. Must be called from within a tokio runtime.
pub fn start_processor(
    config: &ProcessorConfig,
) -> Result<(Arc<PolicyProcessor>, WatcherHandle), ProcessorError> {
    config.validate()?;
    let Some(path) = config.policy_file.clone() else {
        return Err(ProcessorError::Config("policy_file is required".to_owned()));
    };

    let registry = Arc::new(PolicyRegistry::new());
    registry.register(Arc::new(FilePolicyProvider::new(path.clone())))?;

    let processor = Arc::new(PolicyProcessor::new());
    Arc::clone(&processor).attach(&registry);

    tracing::info!(
        path = %path.display(),
        policies = registry.snapshot().len(),
        "Policy processor started"
    );

    let watcher = watch_policy_file(registry, path, config.poll_interval());
    Ok((processor, watcher))
}

/// Handle for the policy file watcher task.
pub struct WatcherHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal the watcher to stop and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.join_handle).await;
    }
}

/// Spawn a task that polls the policy file's modification time and reloads
/// the registry when it changes.
pub fn watch_policy_file(
    registry: Arc<PolicyRegistry>,
    path: PathBuf,
    interval: Duration,
) -> WatcherHandle {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    let join_handle = tokio::spawn(async move {
        tracing::info!(
            path = %path.display(),
            interval_secs = interval.as_secs(),
            "Starting policy file watcher"
        );

        let mut last_seen = fingerprint(&path).await;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let current = fingerprint(&path).await;
                    if current != last_seen {
                        last_seen = current;
                        tracing::debug!(path = %path.display(), "policy file changed");
                        if let Err(err) = registry.reload() {
                            tracing::error!(
                                path = %path.display(),
                                error = %err,
                                "Policy reload failed; keeping previous snapshot"
                            );
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    break;
                }
            }
        }

        tracing::info!(path = %path.display(), "Policy file watcher stopped");
    });

    WatcherHandle {
        shutdown_tx: Some(shutdown_tx),
        join_handle,
    }
}

/// Cheap change signature: modification time plus length. Content is only
/// re-read through the provider when this changes.
async fn fingerprint(path: &Path) -> Option<(SystemTime, u64)> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}
