//! Storage Module
//!
//! The single-file container and the staging copies used to rebuild it.
//!
//! ## Responsibilities
//! - Create or load the container file
//! - Insert, fetch, remove and reorder records
//! - Keep payload order identical to directory order
//! - Never touch the live file or Catalog before a staging copy is complete
//!
//! ## Rebuild Flow
//! ```text
//!   live file ──copy ranges──▶ staging file ──copy back @0──▶ live file
//!                                   ▲                       (truncate on shrink)
//!                 new directory ────┘
//!                 new payload (insert only)
//! ```

mod container;
mod staging;

pub use container::Container;
pub use staging::Staging;
