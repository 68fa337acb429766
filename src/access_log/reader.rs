//! Access Log Reader
//!
//! Loads a whole log into memory for the optimizer.

use std::path::Path;

use crate::error::Result;
use crate::QuarkError;

use super::{AccessEvent, HEADER};

/// Read-only view of an access log
pub struct AccessLog;

impl AccessLog {
    /// Read every event in file order.
    ///
    /// Fails with `AccessLog` when the file is missing, the header is not
    /// `filename,time`, or any row is malformed.
    pub fn read(path: &Path) -> Result<Vec<AccessEvent>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let headers = reader.headers()?;
        if headers.iter().ne(HEADER.iter().copied()) {
            return Err(QuarkError::AccessLog(format!(
                "unexpected header in {:?}: {:?}",
                path, headers
            )));
        }

        let mut events = Vec::new();
        for row in reader.deserialize() {
            let event: AccessEvent = row?;
            events.push(event);
        }
        Ok(events)
    }
}
