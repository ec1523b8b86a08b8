//! Once-only population of a reference table.
//!
//! A table is loaded on first use: if it is missing it is created, and if it
//! is empty it is filled from its source document. Concurrent first callers
//! wait for a single load. When that load fails, every caller that was
//! already waiting receives the same error and the next call tries again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use super::{LoadPlan, ReferenceStore, SchemaResource, TableSpec};
use crate::error::{GazetteerError, Result};
use crate::source::SourceDocument;

#[derive(Debug)]
enum LoadState {
    Unloaded,
    Loaded,
    Failed { attempt: u64, reason: Arc<str> },
}

/// Serializes loads of one table and remembers their outcome.
#[derive(Debug)]
pub struct LoadGate {
    loaded: AtomicBool,
    failures: AtomicU64,
    state: Mutex<LoadState>,
}

impl Default for LoadGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadGate {
    pub fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            failures: AtomicU64::new(0),
            state: Mutex::new(LoadState::Unloaded),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Run `load` unless a previous call already succeeded.
    pub async fn run<F, Fut>(&self, load: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        if self.is_loaded() {
            return Ok(());
        }

        let seen = self.failures.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        match &*state {
            LoadState::Loaded => return Ok(()),
            LoadState::Failed { attempt, reason } if *attempt > seen => {
                return Err(GazetteerError::Ingestion(reason.to_string()));
            }
            _ => {}
        }

        match load().await {
            Ok(()) => {
                *state = LoadState::Loaded;
                self.loaded.store(true, Ordering::Release);
                Ok(())
            }
            Err(e) => {
                let attempt = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                *state = LoadState::Failed {
                    attempt,
                    reason: Arc::from(e.to_string()),
                };
                Err(e)
            }
        }
    }

    /// Run `reload` while holding the gate, so no first load interleaves with it.
    pub async fn exclusive<F, Fut>(&self, reload: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        let mut state = self.state.lock().await;
        reload().await?;
        *state = LoadState::Loaded;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }
}

/// A set of tables filled from one source document.
pub struct ReferenceTable {
    store: ReferenceStore,
    spec: TableSpec,
    source: SourceDocument,
    gate: LoadGate,
}

impl ReferenceTable {
    pub fn new(store: ReferenceStore, resource: SchemaResource, source: SourceDocument) -> Self {
        let spec = store.schema().spec(resource);
        Self {
            store,
            spec,
            source,
            gate: LoadGate::new(),
        }
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    pub fn name(&self) -> &str {
        self.spec.primary()
    }

    pub fn is_loaded(&self) -> bool {
        self.gate.is_loaded()
    }

    pub async fn row_count(&self) -> Result<i64> {
        self.store.count_rows(self.name()).await
    }

    /// Create and fill the tables if needed. `prepare` parses the source
    /// document off the async runtime.
    pub async fn ensure_loaded<F>(&self, prepare: F) -> Result<()>
    where
        F: FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static,
    {
        self.gate
            .run(|| async {
                self.store.ensure_tables(&self.spec).await?;
                if self.row_count().await? > 0 {
                    return Ok(());
                }

                info!("Table {} is empty, loading from {}", self.name(), self.source);
                let plan = self.prepare(prepare).await?;
                self.store.load(&plan).await.map(|_| ())
            })
            .await
            .inspect_err(|e| error!("Failed to load {}: {}", self.name(), e))
    }

    /// Replace the contents of the tables with a fresh parse of the source.
    pub async fn reset<F>(&self, prepare: F) -> Result<()>
    where
        F: FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static,
    {
        self.gate
            .exclusive(|| async {
                self.store.ensure_tables(&self.spec).await?;
                info!("Reloading {} from {}", self.name(), self.source);
                let plan = self.prepare(prepare).await?;
                self.store.replace(&self.spec, &plan).await.map(|_| ())
            })
            .await
            .inspect_err(|e| error!("Failed to reset {}: {}", self.name(), e))
    }

    async fn prepare<F>(&self, prepare: F) -> Result<LoadPlan>
    where
        F: FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static,
    {
        let source = self.source.clone();
        tokio::task::spawn_blocking(move || prepare(source))
            .await
            .map_err(|e| GazetteerError::Ingestion(format!("loader task failed: {}", e)))?
    }
}
