//! JSON state file backing the in-memory collaborators between invocations.

use anyhow::{anyhow, Context, Result};
use handle_provider::{
    ContentObject, Handle, HandleTable, MemoryHandleResolver, MemoryMetadata,
    MemoryVersionHistory, MetadataTable, ObjectId, ObjectKind, ProviderConfig, VersionTable,
    VersionedHandleProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    objects: BTreeMap<ObjectId, ObjectKind>,
    handles: HandleTable,
    versions: VersionTable,
    metadata: MetadataTable,
}

/// Objects, handles, versions and metadata loaded from one state file.
pub struct Workspace {
    path: PathBuf,
    objects: BTreeMap<ObjectId, ObjectKind>,
    resolver: MemoryHandleResolver,
    versions: MemoryVersionHistory,
    metadata: MemoryMetadata,
    provider: VersionedHandleProvider,
}

impl Workspace {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: &Path, config: ProviderConfig) -> Result<Self> {
        let state = if path.exists() {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing state file {}", path.display()))?
        } else {
            StateFile {
                handles: HandleTable {
                    prefix: config.prefix.clone(),
                    next_suffix: 1,
                    ..Default::default()
                },
                ..Default::default()
            }
        };

        let resolver = MemoryHandleResolver::from_table(state.handles);
        let versions = MemoryVersionHistory::from_table(state.versions);
        let metadata = MemoryMetadata::from_table(state.metadata);
        let provider = VersionedHandleProvider::new(
            config,
            Arc::new(resolver.clone()),
            Arc::new(versions.clone()),
            Arc::new(metadata.clone()),
        );

        Ok(Self {
            path: path.to_path_buf(),
            objects: state.objects,
            resolver,
            versions,
            metadata,
            provider,
        })
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, self.to_json()?)
            .with_context(|| format!("writing state file {}", self.path.display()))?;
        debug!(path = %self.path.display(), "saved state file");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let state = StateFile {
            objects: self.objects.clone(),
            handles: self.resolver.snapshot(),
            versions: self.versions.snapshot(),
            metadata: self.metadata.snapshot(),
        };
        Ok(serde_json::to_string_pretty(&state)?)
    }

    pub fn provider(&self) -> &VersionedHandleProvider {
        &self.provider
    }

    pub fn metadata(&self) -> &MemoryMetadata {
        &self.metadata
    }

    pub fn object(&self, id: ObjectId) -> Result<ContentObject> {
        self.objects
            .get(&id)
            .map(|kind| ContentObject::new(id, *kind))
            .ok_or_else(|| anyhow!("unknown object {id}"))
    }

    pub fn create_object(&mut self, kind: ObjectKind) -> ContentObject {
        let object = ContentObject::new(ObjectId::new_v4(), kind);
        self.objects.insert(object.id, kind);
        object
    }

    /// Create and register the next version of `of`'s work.
    pub fn new_version(&mut self, of: ObjectId, summary: &str) -> Result<(ContentObject, Handle)> {
        let original = self.object(of)?;
        if !original.is_versionable() {
            return Err(anyhow!("{original} cannot be versioned"));
        }

        let successor = self.create_object(original.kind);
        self.versions.add_version(of, successor.id, summary)?;
        let handle = self.provider.register(&successor)?;
        Ok((successor, handle))
    }

    /// Remove an object, moving the canonical handle first.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<()> {
        let object = self.object(id)?;
        self.provider.delete(&object)?;
        self.versions.remove_version(id);
        self.objects.remove(&id);
        Ok(())
    }
}
