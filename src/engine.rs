//! Engine Module
//!
//! The store handle that coordinates all components.
//!
//! ## Responsibilities
//! - Own the container, prefetch state, transition graph and access log
//! - Serialize insert/fetch/remove/reorder behind one exclusive lock
//! - Feed the prefetch queue in predictive mode
//! - Run the optimizer and apply its ordering
//! - Start and stop the idle task

use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::access_log::{AccessLog, AccessLogWriter};
use crate::catalog::{ByteIdentifier, Record};
use crate::config::Config;
use crate::error::Result;
use crate::optimizer::{heuristic_reorder, OptimizeMode, TransitionGraph};
use crate::prefetch::{ForegroundSignal, IdleTask, PrefetchCache, PrefetchQueue, Prefetcher};
use crate::storage::Container;
use crate::QuarkError;

/// Everything guarded by the store lock
pub(crate) struct StoreState {
    pub(crate) container: Container,
    pub(crate) cache: PrefetchCache,
}

/// State shared between the engine and its idle task
pub(crate) struct Shared {
    pub(crate) config: Config,

    /// The exclusive store lock: container file + Catalog + prefetch buffers
    pub(crate) state: Mutex<StoreState>,

    /// Pending prefetch targets. Locked after `state` when both are needed.
    pub(crate) queue: Mutex<PrefetchQueue>,

    /// Raised while a foreground operation is in flight
    pub(crate) signal: ForegroundSignal,

    pub(crate) prefetcher: Prefetcher,

    /// Graph from the last optimizer run
    graph: RwLock<Option<Arc<TransitionGraph>>>,

    /// Next-Potential-Caching enabled
    predictive: AtomicBool,

    access_log: Option<Mutex<AccessLogWriter>>,
}

/// The main store handle
///
/// ## Concurrency Model
///
/// - **Foreground** (insert/fetch/remove/reorder): raise the foreground
///   signal, then block on the store lock for the whole operation
/// - **Idle task**: only ever `try_lock`s the store, copies one chunk at a
///   time and backs off as soon as the signal is raised
///
/// No ordering among blocked foreground callers is promised, only mutual
/// exclusion.
pub struct Engine {
    shared: Arc<Shared>,
    idle: Option<IdleTask>,
}

impl Engine {
    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Create the staging directory
    /// 2. Create or load the container
    /// 3. Open the access log (if enabled)
    /// 4. Spawn the idle task (if enabled)
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Staging copies live next to the container by default
        let staging_dir = config.staging_dir();
        fs::create_dir_all(&staging_dir)?;

        // Step 2: Container + Catalog
        let container = Container::open(&config.container_path, &staging_dir)?;

        // Step 3: Access log
        let access_log = if config.record_access {
            let writer = AccessLogWriter::open(&config.access_log_path())?;
            Some(Mutex::new(writer))
        } else {
            None
        };

        let shared = Arc::new(Shared {
            prefetcher: Prefetcher::new(config.prefetch_chunk_size),
            state: Mutex::new(StoreState {
                container,
                cache: PrefetchCache::new(),
            }),
            queue: Mutex::new(PrefetchQueue::new()),
            signal: ForegroundSignal::new(),
            graph: RwLock::new(None),
            predictive: AtomicBool::new(false),
            access_log,
            config,
        });

        // Step 4: Background prefetching
        let idle = if shared.config.idle_task {
            Some(IdleTask::spawn(Arc::clone(&shared))?)
        } else {
            None
        };

        Ok(Self { shared, idle })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified container file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().container_path(path).build())
    }

    // =========================================================================
    // Storage Operations
    // =========================================================================

    /// Insert the file at `source` under its file name.
    ///
    /// `position` defaults to appending after the last record.
    pub fn insert(&self, source: &Path, position: Option<u8>) -> Result<()> {
        let unavailable = |e: std::io::Error| QuarkError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        };

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                unavailable(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "source has no file name",
                ))
            })?;
        let mut file = File::open(source).map_err(unavailable)?;
        let metadata = file.metadata().map_err(unavailable)?;
        if !metadata.is_file() {
            return Err(unavailable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "source is not a regular file",
            )));
        }

        // Read failures surface from the staging copy; report them against the path
        self.insert_reader(&name, &mut file, metadata.len(), position)
            .map_err(|e| match e {
                QuarkError::SourceUnavailable { source, .. } => unavailable(source),
                other => other,
            })
    }

    /// Insert an in-memory payload
    pub fn insert_bytes(&self, name: &str, data: &[u8], position: Option<u8>) -> Result<()> {
        self.insert_reader(name, &mut Cursor::new(data), data.len() as u64, position)
    }

    /// Insert exactly `size` bytes read from `reader`
    pub fn insert_reader<R: Read>(
        &self,
        name: &str,
        reader: &mut R,
        size: u64,
        position: Option<u8>,
    ) -> Result<()> {
        if ByteIdentifier::was_truncated(name) {
            warn!("Name {:?} is longer than 40 bytes and will be truncated", name);
        }
        let id = ByteIdentifier::new(name);

        let _foreground = self.shared.signal.enter();
        let mut state = self.shared.state.lock();

        let position = position
            .map(usize::from)
            .unwrap_or_else(|| state.container.catalog().len());
        state.container.insert(id, reader, size, position)?;
        state.cache.remove(&id);

        info!("Inserted {} ({} bytes) at position {}", id, size, position);
        Ok(())
    }

    /// Copy the payload of `name` into `sink`, returning the bytes written.
    ///
    /// Prefetched bytes are served first, and a buffer that covered the whole
    /// record is released. On success the fetch is logged and,
    /// in predictive mode, its likely successor is queued for prefetching.
    pub fn fetch<W: Write>(&self, name: &str, sink: &mut W) -> Result<u64> {
        let id = ByteIdentifier::new(name);

        let written = {
            let _foreground = self.shared.signal.enter();
            let mut state = self.shared.state.lock();
            let state = &mut *state;

            let cached = state.cache.get(&id).map(|e| e.bytes());
            let written = state.container.fetch(&id, cached, sink)?;

            // A fully served buffer has done its job
            if state.cache.get(&id).is_some_and(|e| e.is_complete(written)) {
                state.cache.remove(&id);
            }

            if self.is_predictive() {
                self.queue_successor(&id, &mut state.cache);
            }
            written
        };

        self.record_access(name);
        debug!("Fetched {} ({} bytes)", id, written);
        Ok(written)
    }

    /// Fetch into a fresh buffer
    pub fn fetch_to_vec(&self, name: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.fetch(name, &mut buf)?;
        Ok(buf)
    }

    /// Remove `name`, shrinking the container
    pub fn remove(&self, name: &str) -> Result<()> {
        let id = ByteIdentifier::new(name);

        let _foreground = self.shared.signal.enter();
        let mut state = self.shared.state.lock();

        let removed = state.container.remove(&id)?;
        state.cache.remove(&id);

        info!("Removed {} ({} bytes)", removed.name, removed.size);
        Ok(())
    }

    /// Rewrite the container so records follow `order` (a permutation of
    /// all stored names)
    pub fn reorder<S: AsRef<str>>(&self, order: &[S]) -> Result<()> {
        let ids: Vec<ByteIdentifier> = order
            .iter()
            .map(|name| ByteIdentifier::new(name.as_ref()))
            .collect();
        self.reorder_ids(&ids)
    }

    fn reorder_ids(&self, order: &[ByteIdentifier]) -> Result<()> {
        let _foreground = self.shared.signal.enter();
        let mut state = self.shared.state.lock();

        state.container.reorder(order)?;

        info!("Reordered {} records", order.len());
        Ok(())
    }

    // =========================================================================
    // Optimizer
    // =========================================================================

    /// Rebuild the transition graph from the access log and apply `mode`.
    ///
    /// Fails with `NoOptimizationAvailable` (leaving the store untouched)
    /// when the log is missing, unreadable, or says nothing about the
    /// stored records.
    pub fn run_optimizer(&self, mode: OptimizeMode) -> Result<()> {
        let graph = Arc::new(self.build_graph()?);
        *self.shared.graph.write() = Some(Arc::clone(&graph));

        match mode {
            OptimizeMode::FrequentNeighbours => {
                let order = heuristic_reorder(&graph);
                info!(
                    "{}: new order {:?}",
                    mode,
                    order.iter().map(|n| n.to_string()).collect::<Vec<_>>()
                );
                self.reorder_ids(&order)
            }
            OptimizeMode::NextPotentialCaching => {
                self.set_predictive(true);
                info!("{}: predictive prefetching enabled", mode);
                Ok(())
            }
        }
    }

    fn build_graph(&self) -> Result<TransitionGraph> {
        let path = self.shared.config.access_log_path();
        let events = AccessLog::read(&path).map_err(|e| {
            QuarkError::NoOptimizationAvailable(format!("access log unavailable: {}", e))
        })?;

        let known: Vec<ByteIdentifier> = {
            let state = self.shared.state.lock();
            state
                .container
                .catalog()
                .records()
                .iter()
                .map(|r| r.name)
                .collect()
        };
        if known.is_empty() {
            return Err(QuarkError::NoOptimizationAvailable(
                "store has no records".to_string(),
            ));
        }

        let graph = TransitionGraph::build(&events, &known);
        if !graph.has_history() {
            return Err(QuarkError::NoOptimizationAvailable(format!(
                "{} log events, none for stored records",
                events.len()
            )));
        }

        for node in graph.nodes() {
            debug!(
                "{} ({}) -> {:?}",
                node.name,
                node.total_weight,
                node.successors.iter().map(|s| s.to_string()).collect::<Vec<_>>()
            );
        }
        Ok(graph)
    }

    /// Turn Next-Potential-Caching on or off.
    ///
    /// Turning it off also discards queued targets and prefetched buffers.
    pub fn set_predictive(&self, enabled: bool) {
        self.shared.predictive.store(enabled, Ordering::SeqCst);
        if !enabled {
            let _foreground = self.shared.signal.enter();
            let mut state = self.shared.state.lock();
            self.shared.queue.lock().clear();
            state.cache.clear();
        }
    }

    pub fn is_predictive(&self) -> bool {
        self.shared.predictive.load(Ordering::SeqCst)
    }

    /// Queue the likely next read after `id` (called with the store lock held)
    fn queue_successor(&self, id: &ByteIdentifier, cache: &mut PrefetchCache) {
        let Some(graph) = self.shared.graph.read().clone() else {
            return;
        };
        let Some(next) = graph.top_successor(id) else {
            return;
        };
        if self.shared.queue.lock().push_hint(next) {
            cache.entry(next);
            debug!("Queued {} for prefetch after {}", next, id);
        }
    }

    fn record_access(&self, name: &str) {
        if let Some(log) = &self.shared.access_log {
            if let Err(e) = log.lock().append(name) {
                warn!("Failed to append {} to access log: {}", name, e);
            }
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the store gracefully
    ///
    /// Stops the idle task and syncs the container to disk
    pub fn close(mut self) -> Result<()> {
        if let Some(mut idle) = self.idle.take() {
            idle.stop();
        }
        self.shared.state.lock().container.sync()?;
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Snapshot of the Catalog, in directory order
    pub fn records(&self) -> Vec<Record> {
        self.shared.state.lock().container.catalog().records().to_vec()
    }

    pub fn record_count(&self) -> u8 {
        self.shared.state.lock().container.catalog().record_count()
    }

    /// Current length of the container file
    pub fn file_len(&self) -> Result<u64> {
        self.shared.state.lock().container.file_len()
    }

    /// Prefetch targets waiting in the queue
    pub fn pending_prefetches(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Bytes of `name` currently held in the prefetch cache
    pub fn prefetched_bytes(&self, name: &str) -> Option<u64> {
        let id = ByteIdentifier::new(name);
        self.shared
            .state
            .lock()
            .cache
            .get(&id)
            .map(|e| e.bytes_buffered())
    }

    /// Graph from the last optimizer run
    pub fn transition_graph(&self) -> Option<Arc<TransitionGraph>> {
        self.shared.graph.read().clone()
    }

    pub fn idle_task_running(&self) -> bool {
        self.idle.as_ref().is_some_and(|t| t.is_running())
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.shared.config.access_log_path()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.shared.config
    }
}
