//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod snapshot;
pub mod tree_service;

pub use error::{ApplicationError, ApplicationResult};
pub use snapshot::{Snapshot, SnapshotFile, SnapshotFormat, SnapshotService};
pub use tree_service::{StructureCheck, TreeService, TreeView};
