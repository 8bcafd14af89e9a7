use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::{KvError, KvResult};
use crate::traits::{KvEngine, KvPair, ReadTxn, WriteTxn};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// Pending writes of one transaction. `None` marks a deletion.
type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// In-memory, `BTreeMap`-based engine.
///
/// Intended for tests and embedding. The committed state is an immutable
/// `Arc<BTreeMap>`; readers clone the `Arc` and keep that snapshot for their
/// whole lifetime. A writer holds the writer mutex and buffers its changes in
/// an overlay over the snapshot it started from. Commit applies the overlay
/// in place, copying the map only while some reader still holds the old
/// snapshot. Data is lost when the engine is dropped.
pub struct InMemoryKv {
    committed: RwLock<Arc<Map>>,
    writer: Mutex<()>,
}

impl InMemoryKv {
    /// Create a new empty engine.
    pub fn new() -> Self {
        Self {
            committed: RwLock::new(Arc::new(Map::new())),
            writer: Mutex::new(()),
        }
    }

    /// Number of committed keys.
    pub fn len(&self) -> KvResult<usize> {
        Ok(self.snapshot()?.len())
    }

    /// Returns `true` if no keys are committed.
    pub fn is_empty(&self) -> KvResult<bool> {
        Ok(self.snapshot()?.is_empty())
    }

    fn snapshot(&self) -> KvResult<Arc<Map>> {
        let committed = self
            .committed
            .read()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))?;
        Ok(Arc::clone(&committed))
    }
}

impl Default for InMemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryKv")
            .field("key_count", &count)
            .finish()
    }
}

impl KvEngine for InMemoryKv {
    fn begin_read(&self) -> KvResult<Box<dyn ReadTxn + '_>> {
        Ok(Box::new(MemoryReadTxn {
            data: self.snapshot()?,
        }))
    }

    fn begin_write(&self) -> KvResult<Box<dyn WriteTxn + '_>> {
        let guard = self
            .writer
            .lock()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))?;
        // Taken after the writer lock so no other commit can slip in between.
        let base = self.snapshot()?;
        Ok(Box::new(MemoryWriteTxn {
            engine: self,
            _guard: guard,
            base,
            overlay: Overlay::new(),
        }))
    }
}

fn in_prefix<'a, V>(
    map: &'a BTreeMap<Vec<u8>, V>,
    prefix: &'a [u8],
) -> impl Iterator<Item = (&'a Vec<u8>, &'a V)> + 'a {
    map.range(prefix.to_vec()..)
        .take_while(move |(key, _)| key.starts_with(prefix))
}

fn scan(map: &Map, prefix: &[u8]) -> Vec<KvPair> {
    in_prefix(map, prefix)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

struct MemoryReadTxn {
    data: Arc<Map>,
}

impl ReadTxn for MemoryReadTxn {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>> {
        Ok(scan(&self.data, prefix))
    }

    fn has_prefix(&self, prefix: &[u8]) -> KvResult<bool> {
        Ok(in_prefix(&self.data, prefix).next().is_some())
    }
}

struct MemoryWriteTxn<'a> {
    engine: &'a InMemoryKv,
    _guard: MutexGuard<'a, ()>,
    base: Arc<Map>,
    overlay: Overlay,
}

impl ReadTxn for MemoryWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        match self.overlay.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => Ok(self.base.get(key).cloned()),
        }
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>> {
        let mut merged: Map = in_prefix(&self.base, prefix)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        for (key, pending) in in_prefix(&self.overlay, prefix) {
            match pending {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn has_prefix(&self, prefix: &[u8]) -> KvResult<bool> {
        if in_prefix(&self.overlay, prefix).any(|(_, pending)| pending.is_some()) {
            return Ok(true);
        }
        let live = in_prefix(&self.base, prefix)
            .any(|(key, _)| !matches!(self.overlay.get(key), Some(None)));
        Ok(live)
    }
}

impl WriteTxn for MemoryWriteTxn<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.overlay.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<bool> {
        let existed = self.get(key)?.is_some();
        self.overlay.insert(key.to_vec(), None);
        Ok(existed)
    }

    fn commit(self: Box<Self>) -> KvResult<()> {
        let MemoryWriteTxn {
            engine,
            _guard,
            base,
            overlay,
        } = *self;
        // Release our hold on the snapshot so `make_mut` can reuse it.
        drop(base);

        let mut committed = engine
            .committed
            .write()
            .map_err(|e| KvError::LockPoisoned(e.to_string()))?;
        let map = Arc::make_mut(&mut *committed);
        for (key, pending) in overlay {
            match pending {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
        // `_guard` is released after the new state is published.
        Ok(())
    }
}
