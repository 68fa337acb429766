//! # Quark
//!
//! A single-file record store with:
//! - A directory of named byte blobs followed by their concatenated payloads
//! - Insert/remove/reorder through staged rebuilds of the container
//! - Background prefetching of predicted next reads
//! - Access-log driven reordering of records on disk
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Engine                               │
//! │        insert / fetch / remove / reorder / optimize         │
//! └──────┬───────────────────┬──────────────────────┬───────────┘
//!        │ store lock        │ try_lock             │ read log
//!        ▼                   ▼                      ▼
//!  ┌─────────────┐    ┌─────────────┐       ┌─────────────┐
//!  │  Container  │◀───│  IdleTask   │       │  Optimizer  │
//!  │  + Catalog  │    │ (prefetch)  │       │   (graph)   │
//!  └──────┬──────┘    └──────┬──────┘       └──────▲──────┘
//!         │                  │                     │
//!         ▼                  ▼                     │
//!  ┌─────────────┐    ┌─────────────┐       ┌──────┴──────┐
//!  │   Staging   │    │PrefetchCache│       │  AccessLog  │
//!  │    copy     │    │  + Queue    │       │    (CSV)    │
//!  └─────────────┘    └─────────────┘       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod catalog;
pub mod storage;
pub mod prefetch;
pub mod access_log;
pub mod optimizer;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{QuarkError, Result};
pub use config::Config;
pub use catalog::{ByteIdentifier, Catalog, Record};
pub use engine::Engine;
pub use optimizer::OptimizeMode;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Quark
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
