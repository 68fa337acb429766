//! Access Log Module
//!
//! Append-only history of completed fetches, consumed by the optimizer.
//!
//! ## Responsibilities
//! - Append one `(filename, unix seconds)` row per foreground fetch
//! - Read the full history back in order
//!
//! ## File Format
//! ```text
//! filename,time
//! a.txt,1700000000
//! b.txt,1700000003
//! ...
//! ```

mod entry;
mod reader;
mod writer;

pub use entry::AccessEvent;
pub use reader::AccessLog;
pub use writer::AccessLogWriter;

/// Header row written at the top of every log
pub const HEADER: [&str; 2] = ["filename", "time"];
