//! Prefetch Module
//!
//! Speculative background loading of the records a reader is predicted to
//! fetch next.
//!
//! ## Responsibilities
//! - Per-record byte buffers filled ahead of time (`PrefetchCache`)
//! - FIFO of pending prefetch targets (`PrefetchQueue`)
//! - Cold-fetch signalling so background work yields to callers
//!   (`ForegroundSignal`)
//! - Chunked, preemptible copying (`Prefetcher`) driven by a background
//!   thread (`IdleTask`)
//!
//! ## Cooperative Preemption
//! ```text
//!  IdleTask                         foreground fetch
//!  ────────                         ────────────────
//!  queue empty / signal raised? ─▶ sleep
//!  try_lock store ──busy──────────▶ sleep
//!  copy 1 chunk ◀───────────────── signal.enter()  (raise)
//!  signal raised? ──yes──▶ unlock ─▶ lock store, copy, unlock
//!                                   guard dropped  (lower)
//! ```

mod cache;
mod idle;
mod queue;
mod worker;

use std::sync::atomic::{AtomicUsize, Ordering};

pub use cache::{PrefetchCache, PrefetchEntry};
pub use idle::IdleTask;
pub use queue::PrefetchQueue;
pub use worker::{PrefetchStep, Prefetcher};

/// Default bytes copied per locked chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Raised while any foreground operation is in flight.
///
/// The idle task polls it before taking the store lock and after every chunk.
#[derive(Debug, Default)]
pub struct ForegroundSignal {
    active: AtomicUsize,
}

impl ForegroundSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal until the returned guard is dropped
    #[must_use = "the signal is lowered when the guard is dropped"]
    pub fn enter(&self) -> ForegroundGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        ForegroundGuard { signal: self }
    }

    pub fn is_raised(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }
}

/// Keeps a `ForegroundSignal` raised while alive
pub struct ForegroundGuard<'a> {
    signal: &'a ForegroundSignal,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.signal.active.fetch_sub(1, Ordering::SeqCst);
    }
}
