//! Descriptive identifier URIs on content objects

use anyhow::Result;
use handle_types::ObjectId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Access to the `identifier.uri` descriptive metadata of an object.
pub trait MetadataSynchronizer: Send + Sync {
    fn descriptive_uris(&self, object: ObjectId) -> Result<Vec<String>>;

    fn add_descriptive_uri(&self, object: ObjectId, uri: &str) -> Result<()>;

    fn clear_descriptive_uris(&self, object: ObjectId) -> Result<()>;

    /// Replace every descriptive URI with `uri`.
    fn set_descriptive_uri(&self, object: ObjectId, uri: &str) -> Result<()> {
        self.clear_descriptive_uris(object)?;
        self.add_descriptive_uri(object, uri)
    }
}

/// Serializable contents of a [`MemoryMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataTable {
    pub uris: BTreeMap<ObjectId, Vec<String>>,
}

/// In-memory metadata catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadata {
    table: Arc<RwLock<MetadataTable>>,
}

impl MemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: MetadataTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    pub fn snapshot(&self) -> MetadataTable {
        self.table.read().clone()
    }
}

impl MetadataSynchronizer for MemoryMetadata {
    fn descriptive_uris(&self, object: ObjectId) -> Result<Vec<String>> {
        Ok(self
            .table
            .read()
            .uris
            .get(&object)
            .cloned()
            .unwrap_or_default())
    }

    fn add_descriptive_uri(&self, object: ObjectId, uri: &str) -> Result<()> {
        self.table
            .write()
            .uris
            .entry(object)
            .or_default()
            .push(uri.to_string());
        Ok(())
    }

    fn clear_descriptive_uris(&self, object: ObjectId) -> Result<()> {
        self.table.write().uris.remove(&object);
        Ok(())
    }
}
