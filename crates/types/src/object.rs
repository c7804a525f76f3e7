use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity of a repository content object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a random identity.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ObjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Kind of repository object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Site,
    Community,
    Collection,
    Item,
    Bitstream,
}

impl ObjectKind {
    /// Only items take part in version histories.
    pub fn capability(self) -> Capability {
        match self {
            ObjectKind::Item => Capability::Versionable,
            _ => Capability::Identifiable,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectKind::Site => "site",
            ObjectKind::Community => "community",
            ObjectKind::Collection => "collection",
            ObjectKind::Item => "item",
            ObjectKind::Bitstream => "bitstream",
        };
        f.write_str(label)
    }
}

/// What identifier treatment an object receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Participates in version histories and carries descriptive metadata.
    Versionable,
    /// Carries a plain identifier only.
    Identifiable,
}

/// A content object as seen by the identifier layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
}

impl ContentObject {
    pub fn new(id: ObjectId, kind: ObjectKind) -> Self {
        Self { id, kind }
    }

    /// A fresh item with a random identity.
    pub fn item() -> Self {
        Self::new(ObjectId::new_v4(), ObjectKind::Item)
    }

    pub fn capability(&self) -> Capability {
        self.kind.capability()
    }

    pub fn is_versionable(&self) -> bool {
        self.capability() == Capability::Versionable
    }
}

impl fmt::Display for ContentObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
