//! Idle Task
//!
//! Background thread that services the prefetch queue in the gaps between
//! foreground operations.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::engine::Shared;
use crate::error::Result;

use super::PrefetchStep;

/// Handle to the running idle thread; stops and joins it on drop
pub struct IdleTask {
    shutdown: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl IdleTask {
    pub(crate) fn spawn(shared: Arc<Shared>) -> Result<Self> {
        let (shutdown, signal) = channel::bounded(1);
        let handle = thread::Builder::new()
            .name("quark-idle".to_string())
            .spawn(move || run(shared, signal))?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    /// Ask the thread to exit and wait for it
    pub fn stop(&mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Idle task panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IdleTask {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Main loop.
///
/// Polls instead of blocking on the store lock so it never delays a
/// foreground caller by more than one chunk.
fn run(shared: Arc<Shared>, shutdown: Receiver<()>) {
    let backoff = shared.config.idle_backoff();
    debug!("Idle task started (backoff {:?})", backoff);

    loop {
        // Step 1: nothing queued, or a foreground operation is in flight
        if shared.queue.lock().is_empty() || shared.signal.is_raised() {
            if !sleep(&shutdown, backoff) {
                break;
            }
            continue;
        }

        // Step 2: never block on the store lock
        let Some(mut state) = shared.state.try_lock() else {
            if !sleep(&shutdown, backoff) {
                break;
            }
            continue;
        };

        // Step 3: copy chunks of the queue head until done or preempted
        let step = {
            let state = &mut *state;
            let mut queue = shared.queue.lock();
            shared.prefetcher.step(
                &mut state.container,
                &mut state.cache,
                &mut queue,
                &shared.signal,
            )
        };
        drop(state);

        match &step {
            PrefetchStep::Complete { name, size } => {
                debug!("Prefetched {} ({} bytes)", name, size)
            }
            PrefetchStep::Preempted { name, buffered } => {
                debug!("Prefetch of {} preempted at {} bytes", name, buffered)
            }
            PrefetchStep::Idle | PrefetchStep::Dropped { .. } => {}
        }

        match shutdown.try_recv() {
            Err(TryRecvError::Empty) => {}
            _ => break,
        }
    }

    debug!("Idle task stopped");
}

/// Sleep for `backoff`; false once shutdown was requested
fn sleep(shutdown: &Receiver<()>, backoff: Duration) -> bool {
    matches!(shutdown.recv_timeout(backoff), Err(RecvTimeoutError::Timeout))
}
