//! Versioned Handle Provider
//!
//! Mints, restores and maintains persistent handles for versioned content.
//! Every version of a work gets its own `prefix/suffix.N` handle while the
//! canonical `prefix/suffix` handle always follows the latest version. Object
//! storage, version histories and descriptive metadata live behind the
//! [`HandleResolver`], [`VersionHistoryTracker`] and [`MetadataSynchronizer`]
//! traits; in-memory implementations are included.

pub mod config;
pub mod errors;
pub mod metadata;
pub mod provider;
pub mod resolution;
pub mod resolver;
pub mod restore;
pub mod versioning;

pub use config::ProviderConfig;
pub use errors::*;
pub use metadata::{MemoryMetadata, MetadataSynchronizer, MetadataTable};
pub use provider::VersionedHandleProvider;
pub use resolution::handle_from_url;
pub use resolver::{HandleResolver, HandleTable, MemoryHandleResolver};
pub use restore::RESTORE_SUMMARY;
pub use versioning::{MemoryVersionHistory, VersionHistoryTracker, VersionTable};

pub use handle_types::{
    Capability, ContentObject, Handle, HistoryId, IdentifierScheme, ObjectId, ObjectKind,
    ParsedHandle, Version,
};
