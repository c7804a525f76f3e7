//! Handle-to-object bindings (the canonical pointer manager)

use anyhow::{bail, Result};
use handle_types::{Handle, ObjectId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage of handle bindings.
///
/// Absence is `Ok(None)`; `Err` is reserved for backend failures.
pub trait HandleResolver: Send + Sync {
    /// Mint a fresh, unversioned handle under the configured prefix and bind it.
    fn create(&self, object: ObjectId) -> Result<Handle>;

    /// Bind a supplied handle to `object`.
    ///
    /// Fails if the handle is already bound to a different object, unless
    /// `force` is set, in which case the binding is taken over.
    fn create_with(&self, object: ObjectId, handle: &Handle, force: bool) -> Result<()>;

    /// Object currently bound to `handle`.
    fn resolve(&self, handle: &Handle) -> Result<Option<ObjectId>>;

    /// The object's primary handle: the earliest binding it still holds.
    fn find_bound_identifier(&self, object: ObjectId) -> Result<Option<Handle>>;

    /// Rebind `handle` to `object`, creating the binding if absent.
    fn repoint(&self, handle: &Handle, object: ObjectId) -> Result<()>;
}

/// Serializable contents of a [`MemoryHandleResolver`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleTable {
    pub prefix: String,
    pub next_suffix: u64,
    /// Handle → object.
    pub bindings: BTreeMap<Handle, ObjectId>,
    /// Object → handles in binding order.
    pub by_object: BTreeMap<ObjectId, Vec<Handle>>,
}

impl HandleTable {
    fn bind(&mut self, handle: &Handle, object: ObjectId) {
        if let Some(previous) = self.bindings.insert(handle.clone(), object) {
            if previous == object {
                return;
            }
            if let Some(list) = self.by_object.get_mut(&previous) {
                list.retain(|h| h != handle);
                if list.is_empty() {
                    self.by_object.remove(&previous);
                }
            }
        }
        let list = self.by_object.entry(object).or_default();
        if !list.contains(handle) {
            list.push(handle.clone());
        }
    }
}

/// In-memory handle resolver (for testing and the CLI state file).
#[derive(Debug, Clone)]
pub struct MemoryHandleResolver {
    table: Arc<RwLock<HandleTable>>,
}

impl MemoryHandleResolver {
    /// Create an empty resolver minting under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_table(HandleTable {
            prefix: prefix.into(),
            next_suffix: 1,
            ..Default::default()
        })
    }

    pub fn from_table(table: HandleTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> HandleTable {
        self.table.read().clone()
    }

    /// All handles bound to an object, oldest first.
    pub fn handles_for(&self, object: ObjectId) -> Vec<Handle> {
        self.table
            .read()
            .by_object
            .get(&object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.table.read().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HandleResolver for MemoryHandleResolver {
    fn create(&self, object: ObjectId) -> Result<Handle> {
        let mut table = self.table.write();
        // Restored handles may already occupy sequence numbers.
        let handle = loop {
            let suffix = table.next_suffix.max(1);
            table.next_suffix = suffix + 1;
            let candidate = Handle::from_parts(&table.prefix, suffix);
            if !table.bindings.contains_key(&candidate) {
                break candidate;
            }
        };
        table.bind(&handle, object);
        Ok(handle)
    }

    fn create_with(&self, object: ObjectId, handle: &Handle, force: bool) -> Result<()> {
        let mut table = self.table.write();
        if let Some(existing) = table.bindings.get(handle) {
            if *existing != object && !force {
                bail!("handle {handle} is already in use by object {existing}");
            }
        }
        table.bind(handle, object);
        Ok(())
    }

    fn resolve(&self, handle: &Handle) -> Result<Option<ObjectId>> {
        Ok(self.table.read().bindings.get(handle).copied())
    }

    fn find_bound_identifier(&self, object: ObjectId) -> Result<Option<Handle>> {
        Ok(self
            .table
            .read()
            .by_object
            .get(&object)
            .and_then(|list| list.first().cloned()))
    }

    fn repoint(&self, handle: &Handle, object: ObjectId) -> Result<()> {
        self.table.write().bind(handle, object);
        Ok(())
    }
}
