//! Access Log Writer
//!
//! Appends events to a CSV log, writing the header when the file is new.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::{AccessEvent, HEADER};

/// Appends access events to a log file
pub struct AccessLogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    appended: u64,
}

impl AccessLogWriter {
    /// Open or create a log, creating its directory as needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            appended: 0,
        })
    }

    /// Append an event stamped now
    pub fn append(&mut self, name: &str) -> Result<()> {
        self.append_event(&AccessEvent::now(name))
    }

    pub fn append_event(&mut self, event: &AccessEvent) -> Result<()> {
        self.writer.serialize(event)?;
        self.writer.flush()?;
        self.appended += 1;
        Ok(())
    }

    /// Events appended through this handle
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
