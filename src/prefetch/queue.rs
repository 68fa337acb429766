//! FIFO of records waiting to be prefetched.

use std::collections::VecDeque;

use crate::catalog::ByteIdentifier;

/// Pending prefetch targets, serviced head first.
///
/// Duplicates further back are tolerated; a target finished earlier is
/// simply found complete when it reaches the head again.
#[derive(Debug, Default)]
pub struct PrefetchQueue {
    items: VecDeque<ByteIdentifier>,
}

impl PrefetchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already the head.
    /// Returns whether it was queued.
    pub fn push_hint(&mut self, name: ByteIdentifier) -> bool {
        if self.items.front() == Some(&name) {
            return false;
        }
        self.items.push_back(name);
        true
    }

    pub fn peek(&self) -> Option<ByteIdentifier> {
        self.items.front().copied()
    }

    /// Dequeue the head if it is `name`
    pub fn pop_if_head(&mut self, name: &ByteIdentifier) -> bool {
        if self.items.front() == Some(name) {
            self.items.pop_front();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ByteIdentifier> {
        self.items.iter()
    }
}
