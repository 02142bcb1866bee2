//! Error types for rust-xmldb

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreName;

/// Main error type for datastore operations
#[derive(Debug, Error)]
pub enum XmldbError {
    /// Datastore directory unset or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// Name is not one of the known datastores
    #[error("No such datastore: {0}")]
    UnknownStore(String),

    /// Datastore has never been connected or loaded
    #[error("Datastore {0} does not exist")]
    NotFound(StoreName),

    /// IO error on a backing file
    #[error("IO error: {op} {}: {source}", path.display())]
    Io {
        /// Failed filesystem call, eg "truncate"
        op: &'static str,
        /// File the call was made on
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copy updated one half of the destination and failed on the other
    #[error("Datastore {to} diverged from its backing file while copying from {from}: {source}")]
    Divergence {
        /// Source datastore
        from: StoreName,
        /// Destination datastore, now inconsistent
        to: StoreName,
        #[source]
        source: Box<XmldbError>,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XmldbError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XmldbError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// True for every flavour of "store not found", including a vanished file
    pub fn is_not_found(&self) -> bool {
        match self {
            XmldbError::UnknownStore(_) | XmldbError::NotFound(_) => true,
            XmldbError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// True if a copy left cache and file disagreeing
    pub fn is_divergence(&self) -> bool {
        matches!(self, XmldbError::Divergence { .. })
    }
}

/// Result type alias for datastore operations
pub type Result<T> = std::result::Result<T, XmldbError>;
