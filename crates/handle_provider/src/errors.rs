//! Error types for the versioned handle provider

use handle_types::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentifierError {
    /// No identifier is bound to the object.
    #[error("No identifier bound to object {object}")]
    NotFound { object: ObjectId },

    /// The resolver itself failed while looking up the object.
    #[error("Identifier not resolvable for object {object}: {source}")]
    NotResolvable {
        object: ObjectId,
        #[source]
        source: anyhow::Error,
    },

    /// Mint, register or reserve failed; the enclosing transaction should abort.
    #[error("Error while attempting to create identifier for object {object}")]
    Fatal {
        object: ObjectId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Error while moving identifier for deleted object {object}")]
    Deletion {
        object: ObjectId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl IdentifierError {
    pub(crate) fn fatal(object: ObjectId, source: anyhow::Error) -> Self {
        Self::Fatal { object, source }
    }

    pub(crate) fn deletion(object: ObjectId, source: anyhow::Error) -> Self {
        Self::Deletion { object, source }
    }

    /// True for failures the caller's transaction must not commit past.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. } | Self::Deletion { .. })
    }
}

pub type Result<T> = std::result::Result<T, IdentifierError>;
