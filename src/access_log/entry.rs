//! Access log rows.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One completed fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Name the caller fetched
    #[serde(rename = "filename")]
    pub name: String,

    /// Unix seconds when the fetch completed
    #[serde(rename = "time")]
    pub timestamp: i64,
}

impl AccessEvent {
    pub fn new(name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            name: name.into(),
            timestamp,
        }
    }

    /// Event stamped with the current time
    pub fn now(name: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::new(name, timestamp)
    }
}
