//! Storage Layer
//!
//! Persistence destinations for recorded batches:
//! - **Artifact targets**: named artifacts in a store, CSV or JSON, with
//!   optional day and size rotation
//! - **Table targets**: one SQLite row per record
//!
//! # Components
//!
//! - [`ArtifactStore`]: Backend contract, implemented by [`LocalStore`] and [`MemoryStore`]
//! - [`ArtifactTarget`]: Format encoding plus rotation state for one target
//! - [`TableSink`]: Row insertion into a SQLite table
//! - [`StorageTarget`]: The configured destination the recorder writes to

mod error;
mod format;
mod local;
mod memory;
mod schema;
mod store;
mod table;
mod target;

pub use error::StorageError;
pub use format::Format;
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use schema::validate_table_name;
pub use store::{ArtifactStore, validate_artifact_name};
pub use table::TableSink;
pub use target::{ArtifactTarget, RotationError, StorageTarget};
