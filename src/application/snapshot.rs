//! Snapshot loading
//!
//! A snapshot is one document holding the member list and the relationship list,
//! either JSON (`.json`) or TOML (anything else).

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{ingest, MemberRecord, Person, Relationship, RelationshipRecord};
use crate::infrastructure::traits::FileSystem;

/// Raw snapshot document before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotFile {
    pub members: Vec<MemberRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

/// Validated members and relationships, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub members: Vec<Person>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Toml,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Toml,
        }
    }
}

/// Reads and validates snapshot files.
pub struct SnapshotService {
    fs: Arc<dyn FileSystem>,
}

impl SnapshotService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Snapshot> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::SnapshotNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("read snapshot: {}", path.display()),
                source: Box::new(e),
            })?;
        let snapshot = Self::parse(&content, SnapshotFormat::from_path(path), path)?;
        debug!(
            "load: {} members, {} relationships",
            snapshot.members.len(),
            snapshot.relationships.len()
        );
        Ok(snapshot)
    }

    /// Parse document text; `origin` is only used in error messages.
    pub fn parse(content: &str, format: SnapshotFormat, origin: &Path) -> ApplicationResult<Snapshot> {
        let invalid = |message: String| ApplicationError::Snapshot {
            path: origin.to_path_buf(),
            message,
        };
        let file: SnapshotFile = match format {
            SnapshotFormat::Json => serde_json::from_str(content).map_err(|e| invalid(e.to_string()))?,
            SnapshotFormat::Toml => toml::from_str(content).map_err(|e| invalid(e.to_string()))?,
        };
        let (members, relationships) = ingest(file.members, file.relationships)?;
        Ok(Snapshot {
            members,
            relationships,
        })
    }
}
