/// Errors from key-value engine operations.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Failure reported by the redb backend.
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// The engine configuration is invalid or could not be parsed.
    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// Result alias for engine operations.
pub type KvResult<T> = Result<T, KvError>;
