use crate::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one version history (one logical work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(pub u64);

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "history-{}", self.0)
    }
}

/// One entry in a version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub history: HistoryId,
    /// Version number, unique within the history and starting at 1.
    pub number: u32,
    /// Content object holding this version.
    pub object: ObjectId,
    /// Free-form reason recorded with the version.
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Version {
    pub fn new(
        history: HistoryId,
        number: u32,
        object: ObjectId,
        summary: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            history,
            number,
            object,
            summary: summary.into(),
            created_at,
        }
    }
}
