//! Staging Copy
//!
//! Builds a complete image of the next container in an anonymous temporary
//! file, then copies it over the live file.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::catalog::Catalog;
use crate::error::Result;

/// Chunk size for copying an insert source
const SOURCE_CHUNK: usize = 64 * 1024;

/// Why copying an insert source failed
#[derive(Debug)]
pub(crate) enum SourceCopyError {
    /// Reading the source failed or it ended early
    Source(io::Error),
    /// Writing the staging file failed
    Staging(io::Error),
}

/// Builder for a full container image
///
/// The backing file has no name and is removed by the OS once dropped, so an
/// abandoned staging copy leaves nothing behind.
pub struct Staging {
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Bytes written so far
    written: u64,
}

impl Staging {
    /// Create an empty staging file inside `dir`
    pub fn new(dir: &Path) -> Result<Self> {
        let file = tempfile::tempfile_in(dir)?;
        Ok(Self {
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Write the count byte and directory of `catalog`
    pub fn write_header(&mut self, catalog: &Catalog) -> Result<()> {
        let header = catalog.encode_header();
        self.writer.write_all(&header)?;
        self.written += header.len() as u64;
        Ok(())
    }

    /// Copy `len` bytes of `src` starting at `offset`
    pub fn copy_range(&mut self, src: &mut File, offset: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        src.seek(SeekFrom::Start(offset))?;
        self.copy_reader(src, len)
    }

    /// Copy exactly `len` bytes from an insert source, keeping read and
    /// write failures apart
    pub(crate) fn copy_source<R: Read>(
        &mut self,
        source: &mut R,
        len: u64,
    ) -> std::result::Result<(), SourceCopyError> {
        let mut buf = vec![0u8; len.min(SOURCE_CHUNK as u64) as usize];
        let mut remaining = len;
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let n = match source.read(&mut buf[..want]) {
                Ok(0) => {
                    return Err(SourceCopyError::Source(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("source ended after {} of {} bytes", len - remaining, len),
                    )))
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(SourceCopyError::Source(e)),
            };
            self.writer
                .write_all(&buf[..n])
                .map_err(SourceCopyError::Staging)?;
            remaining -= n as u64;
        }
        self.written += len;
        Ok(())
    }

    /// Copy exactly `len` bytes of the live file
    fn copy_reader<R: Read>(&mut self, reader: &mut R, len: u64) -> Result<()> {
        let copied = io::copy(&mut reader.take(len), &mut self.writer)?;
        if copied != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("expected {} bytes of the live file, got {}", len, copied),
            )
            .into());
        }
        self.written += len;
        Ok(())
    }

    /// Overwrite `live` from offset 0 with the staged image.
    ///
    /// With `truncate`, the live file is cut to the staged length (needed
    /// when the container shrinks). Returns the new length.
    pub fn apply(self, live: &mut File, truncate: bool) -> Result<u64> {
        let expected = self.written;
        let mut staged = self.writer.into_inner().map_err(|e| e.into_error())?;

        staged.seek(SeekFrom::Start(0))?;
        live.seek(SeekFrom::Start(0))?;

        let copied = io::copy(&mut staged, live)?;
        if copied != expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("staged {} bytes but copied back {}", expected, copied),
            )
            .into());
        }

        if truncate {
            live.set_len(copied)?;
        }
        live.sync_data()?;

        Ok(copied)
    }
}
