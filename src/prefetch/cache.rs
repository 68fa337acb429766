//! Prefetch buffers keyed by record name.

use std::collections::HashMap;

use bytes::BytesMut;

use crate::catalog::ByteIdentifier;

/// Bytes buffered so far for one record, always a prefix of its payload
#[derive(Debug)]
pub struct PrefetchEntry {
    name: ByteIdentifier,
    buffer: BytesMut,
}

impl PrefetchEntry {
    pub fn new(name: ByteIdentifier) -> Self {
        Self {
            name,
            buffer: BytesMut::new(),
        }
    }

    pub fn name(&self) -> &ByteIdentifier {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn bytes_buffered(&self) -> u64 {
        self.buffer.len() as u64
    }

    pub fn is_complete(&self, size: u64) -> bool {
        self.bytes_buffered() >= size
    }

    /// Append the next bytes of the payload
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }
}

/// All prefetch buffers of a store
#[derive(Debug, Default)]
pub struct PrefetchCache {
    entries: HashMap<ByteIdentifier, PrefetchEntry>,
}

impl PrefetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &ByteIdentifier) -> Option<&PrefetchEntry> {
        self.entries.get(name)
    }

    /// Entry for `name`, created empty on first use
    pub fn entry(&mut self, name: ByteIdentifier) -> &mut PrefetchEntry {
        self.entries
            .entry(name)
            .or_insert_with(|| PrefetchEntry::new(name))
    }

    /// Drop the buffer of a record whose payload changed or vanished
    pub fn remove(&mut self, name: &ByteIdentifier) -> Option<PrefetchEntry> {
        self.entries.remove(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes held across all entries
    pub fn buffered_bytes(&self) -> u64 {
        self.entries.values().map(|e| e.bytes_buffered()).sum()
    }
}
