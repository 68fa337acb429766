//! One unit of background prefetch work.

use bytes::BufMut;
use tracing::{trace, warn};

use crate::catalog::ByteIdentifier;
use crate::storage::Container;

use super::{ForegroundSignal, PrefetchCache, PrefetchQueue, DEFAULT_CHUNK_SIZE};

/// Outcome of a single `Prefetcher::step`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefetchStep {
    /// Queue was empty
    Idle,
    /// Head is fully buffered and was dequeued
    Complete { name: ByteIdentifier, size: u64 },
    /// Stopped early for a foreground operation; head stays queued
    Preempted { name: ByteIdentifier, buffered: u64 },
    /// Head could not be prefetched and was dequeued
    Dropped { name: ByteIdentifier },
}

/// Copies the queue head into the cache, one chunk at a time
#[derive(Debug, Clone, Copy)]
pub struct Prefetcher {
    chunk_size: u64,
}

impl Default for Prefetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Prefetcher {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1) as u64,
        }
    }

    /// Advance the queue head.
    ///
    /// Must be called with the store lock held. Copies chunks until the head
    /// is fully buffered or `signal` is raised (checked after every chunk).
    pub fn step(
        &self,
        container: &mut Container,
        cache: &mut PrefetchCache,
        queue: &mut PrefetchQueue,
        signal: &ForegroundSignal,
    ) -> PrefetchStep {
        let Some(name) = queue.peek() else {
            return PrefetchStep::Idle;
        };

        let Some(location) = container.catalog().locate(&name) else {
            warn!("Prefetch target {} is no longer stored, dropping it", name);
            queue.pop_if_head(&name);
            return PrefetchStep::Dropped { name };
        };

        let entry = cache.entry(name);
        while !entry.is_complete(location.size) {
            let skip = entry.bytes_buffered();
            let want = (location.size - skip).min(self.chunk_size);
            entry.buffer_mut().reserve(want as usize);

            let copied = {
                let mut writer = entry.buffer_mut().writer();
                container.read_payload(&location, skip, want, &mut writer)
            };
            match copied {
                Ok(0) => {
                    warn!("Prefetch of {} hit end of file at {} bytes", name, skip);
                    queue.pop_if_head(&name);
                    return PrefetchStep::Dropped { name };
                }
                Ok(copied) => {
                    trace!("Prefetched {} bytes of {} at {}", copied, entry.name(), skip)
                }
                Err(e) => {
                    warn!("Prefetch of {} failed: {}", name, e);
                    queue.pop_if_head(&name);
                    return PrefetchStep::Dropped { name };
                }
            }

            if signal.is_raised() && !entry.is_complete(location.size) {
                return PrefetchStep::Preempted {
                    name,
                    buffered: entry.bytes_buffered(),
                };
            }
        }

        queue.pop_if_head(&name);
        PrefetchStep::Complete {
            name,
            size: location.size,
        }
    }
}
