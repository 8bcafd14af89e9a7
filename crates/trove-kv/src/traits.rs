use crate::error::KvResult;

/// A key and its value, as returned by prefix scans.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// A consistent, read-only view of the engine.
///
/// Every read issued through one `ReadTxn` observes the same snapshot, no
/// matter what writers commit in the meantime.
pub trait ReadTxn {
    /// Point lookup. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>>;

    /// Check whether a key is present.
    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Check whether any key starts with `prefix`.
    ///
    /// Default implementation scans the whole prefix. Backends should
    /// override it to stop at the first match.
    fn has_prefix(&self, prefix: &[u8]) -> KvResult<bool> {
        Ok(!self.scan_prefix_keys(prefix)?.is_empty())
    }

    /// Keys starting with `prefix`, in ascending order.
    ///
    /// Default implementation drops the values from [`scan_prefix`].
    /// Backends may override to avoid copying values.
    ///
    /// [`scan_prefix`]: ReadTxn::scan_prefix
    fn scan_prefix_keys(&self, prefix: &[u8]) -> KvResult<Vec<Vec<u8>>> {
        Ok(self
            .scan_prefix(prefix)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }
}

/// An exclusive read-write transaction.
///
/// Reads see the transaction's own uncommitted writes. Changes become visible
/// to other transactions only after [`commit`] returns `Ok`; dropping the
/// transaction instead aborts it.
///
/// [`commit`]: WriteTxn::commit
pub trait WriteTxn: ReadTxn {
    /// Insert or overwrite a key.
    fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()>;

    /// Remove a key. Returns `true` if it existed.
    fn delete(&mut self, key: &[u8]) -> KvResult<bool>;

    /// Atomically publish every write made in this transaction.
    fn commit(self: Box<Self>) -> KvResult<()>;

    /// Remove every key starting with `prefix`. Returns how many were removed.
    fn delete_prefix(&mut self, prefix: &[u8]) -> KvResult<usize> {
        let keys = self.scan_prefix_keys(prefix)?;
        for key in &keys {
            self.delete(key)?;
        }
        Ok(keys.len())
    }
}

/// An ordered, transactional key-value engine.
///
/// Implementations must be thread-safe (`Send + Sync`), allow a single
/// writer at a time, and give readers snapshot isolation.
pub trait KvEngine: Send + Sync {
    /// Open a snapshot read transaction. Never waits for the writer.
    fn begin_read(&self) -> KvResult<Box<dyn ReadTxn + '_>>;

    /// Open the write transaction, waiting for any active writer to finish.
    fn begin_write(&self) -> KvResult<Box<dyn WriteTxn + '_>>;
}
