//! Catalog Module
//!
//! In-memory mirror of the container's on-disk directory.
//!
//! ## Responsibilities
//! - Fixed-width record names (`ByteIdentifier`)
//! - Directory entries (`Record`) and their 48-byte encoding
//! - Offset arithmetic: header length, payload offsets, total file length
//! - Loading and validating the directory of an existing container
//!
//! ## Directory Format
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ Count: u8 (1)                                │
//! ├──────────────────────────────────────────────┤
//! │ Record 0: Name [u8; 40] | Size: u64 LE (8)   │
//! │ ... repeated Count times ...                 │
//! ├──────────────────────────────────────────────┤
//! │ Payload 0 | Payload 1 | ... (directory order) │
//! └──────────────────────────────────────────────┘
//! ```

mod directory;
mod identifier;

pub use directory::{Catalog, Location, Record};
pub use identifier::ByteIdentifier;

// =============================================================================
// Shared Constants
// =============================================================================

/// Width of a record name on disk
pub const NAME_LEN: usize = 40;

/// Size of the leading record-count field
pub const COUNT_SIZE: u64 = 1;

/// Size of one directory entry: Name (40) + Size (8)
pub const RECORD_SIZE: u64 = NAME_LEN as u64 + 8;

/// The count field is a single byte
pub const MAX_RECORDS: usize = u8::MAX as usize;
