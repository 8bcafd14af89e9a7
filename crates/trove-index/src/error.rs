//! Error types for the index layer.

use tracing::error;
use trove_kv::KvError;
use trove_types::TypeError;

/// Errors that can occur during index operations.
///
/// Variants fall into four groups: not-found outcomes, caller precondition
/// violations, membership no-ops, and integrity violations. The last group
/// means the stored indexes disagree with each other and must never be
/// ignored by callers.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// No collection is registered at this address.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// No item is registered with this content id.
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The folder path does not exist in the collection.
    #[error("folder not found: {address}:{path:?}")]
    FolderNotFound { address: String, path: String },

    /// A non-root folder was created before its parent.
    #[error("parent folder not found: {address}:{path:?}")]
    ParentFolderNotFound { address: String, path: String },

    /// The item is already a member of the collection.
    #[error("item {cid} is already in collection {address}")]
    ItemAlreadyInCollection { cid: String, address: String },

    /// The item is not a member of the collection.
    #[error("item {cid} is not in collection {address}")]
    ItemNotInCollection { cid: String, address: String },

    /// The item is not a member of the folder.
    #[error("item {cid} is not in folder {address}:{path:?}")]
    ItemNotInFolder {
        cid: String,
        address: String,
        path: String,
    },

    /// The request is malformed or not allowed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A value object failed validation.
    #[error("invalid value: {0}")]
    InvalidValue(#[from] TypeError),

    /// Forward and reverse indexes disagree, or a stored value is malformed.
    #[error("index integrity violation: {reason}")]
    IntegrityViolation { reason: String },

    /// Key-value engine failure.
    #[error("engine error: {0}")]
    Kv(#[from] KvError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl IndexError {
    /// Build an integrity violation, logging it at error level.
    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        error!(%reason, "index integrity violation");
        Self::IntegrityViolation { reason }
    }

    /// Returns `true` for collection, item, or folder not-found outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CollectionNotFound(_)
                | Self::ItemNotFound(_)
                | Self::FolderNotFound { .. }
                | Self::ParentFolderNotFound { .. }
        )
    }

    /// Returns `true` when the caller supplied an invalid request.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidValue(_))
    }

    /// Returns `true` when the stored indexes are inconsistent.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
