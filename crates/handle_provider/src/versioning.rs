//! Version histories of versionable content objects

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use handle_types::{HistoryId, ObjectId, Version};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Read and append access to version histories.
pub trait VersionHistoryTracker: Send + Sync {
    /// History the object belongs to, if any.
    fn find_by_object(&self, object: ObjectId) -> Result<Option<HistoryId>>;

    /// Start an empty history.
    fn create(&self) -> Result<HistoryId>;

    /// All versions of a history, ascending by number.
    fn versions(&self, history: HistoryId) -> Result<Vec<Version>>;

    /// Record `object` as version `number`.
    fn create_version(
        &self,
        history: HistoryId,
        object: ObjectId,
        summary: &str,
        created_at: DateTime<Utc>,
        number: u32,
    ) -> Result<Version>;

    /// The version record holding `object`.
    fn find_version(&self, history: HistoryId, object: ObjectId) -> Result<Option<Version>> {
        Ok(self
            .versions(history)?
            .into_iter()
            .find(|v| v.object == object))
    }

    /// Version with the highest number.
    fn latest(&self, history: HistoryId) -> Result<Option<Version>> {
        Ok(self.versions(history)?.into_iter().max_by_key(|v| v.number))
    }

    /// Closest version numbered below `version`.
    fn previous(&self, history: HistoryId, version: &Version) -> Result<Option<Version>> {
        Ok(self
            .versions(history)?
            .into_iter()
            .filter(|v| v.number < version.number)
            .max_by_key(|v| v.number))
    }

    /// True when no version precedes `version`.
    fn is_first(&self, history: HistoryId, version: &Version) -> Result<bool> {
        Ok(self.previous(history, version)?.is_none())
    }
}

/// Serializable contents of a [`MemoryVersionHistory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTable {
    pub next_history: u64,
    pub histories: BTreeMap<HistoryId, Vec<Version>>,
}

impl VersionTable {
    fn history_of(&self, object: ObjectId) -> Option<HistoryId> {
        self.histories
            .iter()
            .find(|(_, versions)| versions.iter().any(|v| v.object == object))
            .map(|(id, _)| *id)
    }
}

/// In-memory version history store.
#[derive(Debug, Clone, Default)]
pub struct MemoryVersionHistory {
    table: Arc<RwLock<VersionTable>>,
}

impl MemoryVersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: VersionTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    pub fn snapshot(&self) -> VersionTable {
        self.table.read().clone()
    }

    /// Create `successor` as the next version of `object`'s work.
    ///
    /// A work without a history gets one, with `object` as version 1.
    pub fn add_version(
        &self,
        object: ObjectId,
        successor: ObjectId,
        summary: &str,
    ) -> Result<Version> {
        let history = match self.find_by_object(object)? {
            Some(history) => history,
            None => {
                let history = self.create()?;
                self.create_version(history, object, "", Utc::now(), 1)?;
                history
            }
        };
        let next = self.latest(history)?.map_or(1, |v| v.number + 1);
        self.create_version(history, successor, summary, Utc::now(), next)
    }

    /// Drop the version record holding `object`, and the history once empty.
    pub fn remove_version(&self, object: ObjectId) -> Option<Version> {
        let mut table = self.table.write();
        let history = table.history_of(object)?;
        let versions = table.histories.get_mut(&history)?;
        let position = versions.iter().position(|v| v.object == object)?;
        let removed = versions.remove(position);
        if versions.is_empty() {
            table.histories.remove(&history);
        }
        Some(removed)
    }
}

impl VersionHistoryTracker for MemoryVersionHistory {
    fn find_by_object(&self, object: ObjectId) -> Result<Option<HistoryId>> {
        Ok(self.table.read().history_of(object))
    }

    fn create(&self) -> Result<HistoryId> {
        let mut table = self.table.write();
        table.next_history += 1;
        let id = HistoryId(table.next_history);
        table.histories.insert(id, Vec::new());
        Ok(id)
    }

    fn versions(&self, history: HistoryId) -> Result<Vec<Version>> {
        let table = self.table.read();
        let versions = table
            .histories
            .get(&history)
            .ok_or_else(|| anyhow!("unknown version history {history}"))?;
        let mut versions = versions.clone();
        versions.sort_by_key(|v| v.number);
        Ok(versions)
    }

    fn create_version(
        &self,
        history: HistoryId,
        object: ObjectId,
        summary: &str,
        created_at: DateTime<Utc>,
        number: u32,
    ) -> Result<Version> {
        if number == 0 {
            bail!("version numbers start at 1");
        }

        let mut table = self.table.write();
        if let Some(owner) = table.history_of(object) {
            if owner != history {
                bail!("object {object} already belongs to {owner}");
            }
        }

        let versions = table
            .histories
            .get_mut(&history)
            .ok_or_else(|| anyhow!("unknown version history {history}"))?;

        if let Some(existing) = versions.iter().find(|v| v.object == object) {
            if existing.number != number {
                bail!(
                    "object {object} is already version {} of {history}",
                    existing.number
                );
            }
        }

        let version = Version::new(history, number, object, summary, created_at);
        // Reinstating a number rebinds that record instead of duplicating it.
        match versions.iter_mut().find(|v| v.number == number) {
            Some(slot) => *slot = version.clone(),
            None => versions.push(version.clone()),
        }
        Ok(version)
    }
}
