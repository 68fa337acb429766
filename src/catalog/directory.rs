//! Directory entries and the in-memory Catalog.

use std::collections::HashSet;
use std::io::Read;

use crate::error::Result;
use crate::QuarkError;

use super::{ByteIdentifier, COUNT_SIZE, MAX_RECORDS, NAME_LEN, RECORD_SIZE};

/// One directory entry: a name bound to a payload size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub name: ByteIdentifier,
    pub size: u64,
}

impl Record {
    pub fn new(name: ByteIdentifier, size: u64) -> Self {
        Self { name, size }
    }

    /// Encode as `[name (40)][size u64 LE (8)]`
    pub fn encode(&self) -> [u8; RECORD_SIZE as usize] {
        let mut buf = [0u8; RECORD_SIZE as usize];
        buf[..NAME_LEN].copy_from_slice(self.name.as_bytes());
        buf[NAME_LEN..].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; RECORD_SIZE as usize]) -> Self {
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&buf[..NAME_LEN]);
        let mut size = [0u8; 8];
        size.copy_from_slice(&buf[NAME_LEN..]);
        Self {
            name: ByteIdentifier::from_bytes(name),
            size: u64::from_le_bytes(size),
        }
    }
}

/// Where a record lives in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Position in directory (and payload) order
    pub index: usize,
    /// Absolute byte offset of the payload
    pub offset: u64,
    /// Payload length
    pub size: u64,
}

/// In-memory mirror of the on-disk directory
///
/// Record order is directory order is payload order: the payload of
/// `records[i]` starts right after the payloads of `records[..i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<Record>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from an ordered record list
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        if records.len() > MAX_RECORDS {
            return Err(QuarkError::StoreFull);
        }
        Ok(Self { records })
    }

    /// Load the directory of an existing container.
    ///
    /// `file_len` is the container's length; it must equal the header length
    /// plus the sum of all payload sizes.
    pub fn load<R: Read>(reader: &mut R, file_len: u64) -> Result<Self> {
        if file_len < COUNT_SIZE {
            return Err(QuarkError::Format(
                "container is missing its record count".to_string(),
            ));
        }

        let mut count = [0u8; 1];
        reader.read_exact(&mut count)?;
        let count = count[0] as usize;

        let header_len = Self::header_len_for(count);
        if file_len < header_len {
            return Err(QuarkError::Format(format!(
                "declared {} records need a {} byte directory, file has {} bytes",
                count, header_len, file_len
            )));
        }

        let mut records = Vec::with_capacity(count);
        let mut seen = HashSet::with_capacity(count);
        let mut expected_len = header_len;
        for _ in 0..count {
            let mut buf = [0u8; RECORD_SIZE as usize];
            reader.read_exact(&mut buf)?;
            let record = Record::decode(&buf);

            if !seen.insert(record.name) {
                return Err(QuarkError::Format(format!(
                    "duplicate record name in directory: {}",
                    record.name
                )));
            }
            expected_len = expected_len.checked_add(record.size).ok_or_else(|| {
                QuarkError::Format(format!("record {} size overflows", record.name))
            })?;
            records.push(record);
        }

        if expected_len != file_len {
            return Err(QuarkError::Format(format!(
                "directory describes {} bytes, file has {} bytes",
                expected_len, file_len
            )));
        }

        Ok(Self { records })
    }

    /// Encode count byte plus all directory entries
    pub fn encode_header(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.header_len() as usize);
        buf.push(self.record_count());
        for record in &self.records {
            buf.extend_from_slice(&record.encode());
        }
        buf
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn record_count(&self) -> u8 {
        self.records.len() as u8
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= MAX_RECORDS
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn contains(&self, name: &ByteIdentifier) -> bool {
        self.records.iter().any(|r| r.name == *name)
    }

    /// Count byte plus directory entries
    pub fn header_len(&self) -> u64 {
        Self::header_len_for(self.records.len())
    }

    fn header_len_for(count: usize) -> u64 {
        COUNT_SIZE + RECORD_SIZE * count as u64
    }

    /// Sum of all payload sizes
    pub fn payload_len(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// Expected length of the container file
    pub fn total_len(&self) -> u64 {
        self.header_len() + self.payload_len()
    }

    /// Absolute offset of the payload at `index`
    /// (`index == len()` gives the end of the payload stream)
    pub fn payload_offset(&self, index: usize) -> u64 {
        let preceding: u64 = self.records[..index].iter().map(|r| r.size).sum();
        self.header_len() + preceding
    }

    /// Find a record and compute its payload offset in one pass
    pub fn locate(&self, name: &ByteIdentifier) -> Option<Location> {
        let mut offset = self.header_len();
        for (index, record) in self.records.iter().enumerate() {
            if record.name == *name {
                return Some(Location {
                    index,
                    offset,
                    size: record.size,
                });
            }
            offset += record.size;
        }
        None
    }

    // =========================================================================
    // Mutation (callers keep the file in step)
    // =========================================================================

    /// Insert at `position`, shifting later records back
    pub fn insert(&mut self, position: usize, record: Record) -> Result<()> {
        if self.is_full() {
            return Err(QuarkError::StoreFull);
        }
        if position > self.records.len() {
            return Err(QuarkError::InvalidPosition {
                position,
                count: self.records.len(),
            });
        }
        self.records.insert(position, record);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Record {
        self.records.remove(index)
    }
}
