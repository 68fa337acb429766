//! Container
//!
//! The live container file plus its Catalog. Every mutation rebuilds the file
//! through a `Staging` copy and only then touches the live file and Catalog.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::{ByteIdentifier, Catalog, Location, Record};
use crate::error::Result;
use crate::QuarkError;

use super::staging::SourceCopyError;
use super::Staging;

/// A container file and the in-memory mirror of its directory
///
/// Not synchronized: the engine wraps it in its store lock.
pub struct Container {
    /// Live file handle (read + write)
    file: File,
    /// Directory mirror, always equal to what is on disk
    catalog: Catalog,
    /// Where staging copies are created
    staging_dir: PathBuf,
}

impl Container {
    /// Open a container, creating an empty one if `path` does not exist
    pub fn open(path: &Path, staging_dir: &Path) -> Result<Self> {
        let (file, catalog) = if path.exists() {
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            let file_len = file.metadata()?.len();
            let catalog = Catalog::load(&mut BufReader::new(&file), file_len)?;
            info!(
                "Loaded container {:?}: {} records, {} bytes",
                path,
                catalog.record_count(),
                file_len
            );
            (file, catalog)
        } else {
            let mut file = OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(path)?;
            let catalog = Catalog::new();
            file.write_all(&catalog.encode_header())?;
            file.sync_all()?;
            info!("Created empty container {:?}", path);
            (file, catalog)
        };

        Ok(Self {
            file,
            catalog,
            staging_dir: staging_dir.to_path_buf(),
        })
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Insert `size` bytes from `source` as `name` at directory `position`.
    ///
    /// Payloads of records before `position` keep their bytes; the new payload
    /// goes between them and the payloads of records at/after `position`.
    ///
    /// A source that fails to read or ends before `size` bytes gives
    /// `SourceUnavailable`, with the record name as its `path`.
    pub fn insert<R: Read>(
        &mut self,
        name: ByteIdentifier,
        source: &mut R,
        size: u64,
        position: usize,
    ) -> Result<()> {
        if self.catalog.contains(&name) {
            return Err(QuarkError::NameCollision(name.to_string()));
        }
        if position > self.catalog.len() {
            return Err(QuarkError::InvalidPosition {
                position,
                count: self.catalog.len(),
            });
        }
        if self.catalog.is_full() {
            return Err(QuarkError::StoreFull);
        }

        let mut next = self.catalog.clone();
        next.insert(position, Record::new(name, size))?;

        // Old-file coordinates of the split point
        let header_len = self.catalog.header_len();
        let split = self.catalog.payload_offset(position);
        let total_len = self.catalog.total_len();

        let mut staging = Staging::new(&self.staging_dir)?;
        staging.write_header(&next)?;
        staging.copy_range(&mut self.file, header_len, split - header_len)?;
        staging
            .copy_source(source, size)
            .map_err(|e| match e {
                SourceCopyError::Source(source) => QuarkError::SourceUnavailable {
                    path: PathBuf::from(name.to_string()),
                    source,
                },
                SourceCopyError::Staging(e) => QuarkError::Io(e),
            })?;
        staging.copy_range(&mut self.file, split, total_len - split)?;

        // Insert only grows the file
        let new_len = staging.apply(&mut self.file, false)?;
        self.catalog = next;

        debug!(
            "Inserted {} ({} bytes) at position {}, container now {} bytes",
            name, size, position, new_len
        );
        Ok(())
    }

    /// Copy the payload of `name` into `sink`.
    ///
    /// `cached` holds bytes already prefetched from the start of the payload;
    /// they are emitted first and only the remainder is read from disk.
    pub fn fetch<W: Write>(
        &mut self,
        name: &ByteIdentifier,
        cached: Option<&[u8]>,
        sink: &mut W,
    ) -> Result<u64> {
        if self.catalog.is_empty() {
            return Err(QuarkError::EmptyStore);
        }
        let location = self
            .catalog
            .locate(name)
            .ok_or_else(|| QuarkError::NotFound(name.to_string()))?;

        let mut written = 0u64;
        if let Some(buffered) = cached {
            let usable = (buffered.len() as u64).min(location.size) as usize;
            sink.write_all(&buffered[..usable])?;
            written = usable as u64;
            if written == location.size {
                return Ok(written);
            }
        }

        let remaining = location.size - written;
        self.file.seek(SeekFrom::Start(location.offset + written))?;
        let copied = io::copy(&mut (&mut self.file).take(remaining), sink)?;
        if copied != remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} truncated: expected {} bytes, read {}", name, remaining, copied),
            )
            .into());
        }

        Ok(written + copied)
    }

    /// Remove `name`, shrinking the file by its payload size
    pub fn remove(&mut self, name: &ByteIdentifier) -> Result<Record> {
        if self.catalog.is_empty() {
            return Err(QuarkError::EmptyStore);
        }
        let location = self
            .catalog
            .locate(name)
            .ok_or_else(|| QuarkError::NotFound(name.to_string()))?;

        let mut next = self.catalog.clone();
        let removed = next.remove(location.index);

        let header_len = self.catalog.header_len();
        let gap_end = location.offset + location.size;
        let total_len = self.catalog.total_len();

        let mut staging = Staging::new(&self.staging_dir)?;
        staging.write_header(&next)?;
        staging.copy_range(&mut self.file, header_len, location.offset - header_len)?;
        staging.copy_range(&mut self.file, gap_end, total_len - gap_end)?;

        let new_len = staging.apply(&mut self.file, true)?;
        self.catalog = next;

        debug!(
            "Removed {} ({} bytes), container now {} bytes",
            removed.name, removed.size, new_len
        );
        Ok(removed)
    }

    /// Rewrite the container so records (and payloads) follow `order`.
    ///
    /// `order` must name every record exactly once.
    pub fn reorder(&mut self, order: &[ByteIdentifier]) -> Result<()> {
        let mut seen = HashSet::with_capacity(order.len());
        let mut records = Vec::with_capacity(order.len());
        let mut sources: Vec<Location> = Vec::with_capacity(order.len());

        for name in order {
            let location = self
                .catalog
                .locate(name)
                .ok_or_else(|| QuarkError::UnknownRecord(name.to_string()))?;
            if !seen.insert(*name) {
                return Err(QuarkError::InvalidOrder(format!("{} listed twice", name)));
            }
            records.push(self.catalog.records()[location.index]);
            sources.push(location);
        }

        if records.len() != self.catalog.len() {
            return Err(QuarkError::InvalidOrder(format!(
                "expected {} names, got {}",
                self.catalog.len(),
                records.len()
            )));
        }

        let next = Catalog::from_records(records)?;
        if next == self.catalog {
            debug!("Reorder matches current layout, nothing to rewrite");
            return Ok(());
        }

        let mut staging = Staging::new(&self.staging_dir)?;
        staging.write_header(&next)?;
        for source in &sources {
            staging.copy_range(&mut self.file, source.offset, source.size)?;
        }

        // Same records, same sizes: length is unchanged
        let new_len = staging.apply(&mut self.file, false)?;
        self.catalog = next;

        debug!("Reordered {} records ({} bytes)", self.catalog.len(), new_len);
        Ok(())
    }

    /// Copy up to `max` payload bytes of the record at `location`, starting
    /// `skip` bytes into the payload.
    ///
    /// Returns the bytes copied, which is short only when the file ends early.
    pub fn read_payload<W: Write>(
        &mut self,
        location: &Location,
        skip: u64,
        max: u64,
        sink: &mut W,
    ) -> Result<u64> {
        let want = location.size.saturating_sub(skip).min(max);
        if want == 0 {
            return Ok(0);
        }
        self.file.seek(SeekFrom::Start(location.offset + skip))?;
        let copied = io::copy(&mut (&mut self.file).take(want), sink)?;
        Ok(copied)
    }

    /// Flush file contents and metadata to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Current on-disk length
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
