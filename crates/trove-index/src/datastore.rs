//! The [`Datastore`] handle, transaction helpers and existence guards.

use std::sync::Arc;

use trove_kv::{EngineConfig, InMemoryKv, KvEngine, ReadTxn, WriteTxn};
use trove_types::TypeError;

use crate::error::{IndexError, IndexResult};
use crate::keys;

/// Index layer over one key-value engine.
///
/// Every mutating method runs in exactly one write transaction and either
/// commits all of its forward and reverse index writes or none of them.
/// Read methods use their own snapshot and never wait for the writer.
///
/// `Datastore` is cheap to clone; clones share the engine.
#[derive(Clone)]
pub struct Datastore {
    engine: Arc<dyn KvEngine>,
}

impl Datastore {
    pub fn new(engine: Arc<dyn KvEngine>) -> Self {
        Self { engine }
    }

    /// A datastore over a fresh [`InMemoryKv`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryKv::new()))
    }

    /// Open the engine described by `config`.
    pub fn open(config: &EngineConfig) -> IndexResult<Self> {
        Ok(Self::new(config.open()?))
    }

    pub fn engine(&self) -> &Arc<dyn KvEngine> {
        &self.engine
    }

    /// Run `f` against a read snapshot.
    pub(crate) fn view<T>(
        &self,
        f: impl FnOnce(&dyn ReadTxn) -> IndexResult<T>,
    ) -> IndexResult<T> {
        let txn = self.engine.begin_read()?;
        f(&*txn)
    }

    /// Run `f` in a write transaction, committing only if it succeeds.
    ///
    /// On error the transaction is dropped, which discards every write `f`
    /// made.
    pub(crate) fn update<T>(
        &self,
        f: impl FnOnce(&mut dyn WriteTxn) -> IndexResult<T>,
    ) -> IndexResult<T> {
        let mut txn = self.engine.begin_write()?;
        let out = f(&mut *txn)?;
        txn.commit()?;
        Ok(out)
    }
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Input checks
// ---------------------------------------------------------------------------

pub(crate) fn check_address(address: &str) -> IndexResult<()> {
    if address.is_empty() {
        return Err(TypeError::EmptyField { field: "address" }.into());
    }
    Ok(())
}

pub(crate) fn check_cid(cid: &str) -> IndexResult<()> {
    if cid.is_empty() {
        return Err(TypeError::EmptyField { field: "cid" }.into());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Existence guards
// ---------------------------------------------------------------------------

pub(crate) fn require_collection<T: ReadTxn + ?Sized>(txn: &T, address: &str) -> IndexResult<()> {
    check_address(address)?;
    if txn.contains(&keys::collection_marker(address))? {
        Ok(())
    } else {
        Err(IndexError::CollectionNotFound(address.to_string()))
    }
}

pub(crate) fn require_item<T: ReadTxn + ?Sized>(txn: &T, cid: &str) -> IndexResult<()> {
    check_cid(cid)?;
    if txn.contains(&keys::item_marker(cid))? {
        Ok(())
    } else {
        Err(IndexError::ItemNotFound(cid.to_string()))
    }
}

/// Check the collection, then the folder path inside it.
pub(crate) fn require_folder<T: ReadTxn + ?Sized>(
    txn: &T,
    address: &str,
    path: &str,
) -> IndexResult<()> {
    require_collection(txn, address)?;
    if txn.contains(&keys::folder_marker(address, path))? {
        Ok(())
    } else {
        Err(IndexError::FolderNotFound {
            address: address.to_string(),
            path: path.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trove_types::{Collection, Folder, Item, Tag};

    // -----------------------------------------------------------------------
    // Guards
    // -----------------------------------------------------------------------

    #[test]
    fn guards_report_not_found() {
        let ds = Datastore::in_memory();
        ds.view(|txn| {
            assert!(matches!(
                require_collection(txn, "test.com"),
                Err(IndexError::CollectionNotFound(_))
            ));
            assert!(matches!(require_item(txn, "Qm1"), Err(IndexError::ItemNotFound(_))));
            assert!(matches!(
                require_folder(txn, "test.com", ""),
                Err(IndexError::CollectionNotFound(_))
            ));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn empty_identifiers_are_precondition_violations() {
        let ds = Datastore::in_memory();
        let err = ds.read_collection("").unwrap_err();
        assert!(err.is_precondition_violation());
        let err = ds.read_item("").unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn guards_see_writes_in_the_same_transaction() {
        let ds = Datastore::in_memory();
        ds.update(|txn| {
            txn.put(&keys::item_marker("Qm1"), b"Qm1")?;
            require_item(&*txn, "Qm1")
        })
        .unwrap();
        ds.view(|txn| require_item(txn, "Qm1")).unwrap();
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    #[test]
    fn failed_update_leaves_no_partial_writes() {
        let ds = Datastore::in_memory();
        let err = ds
            .update(|txn| -> IndexResult<()> {
                txn.put(&keys::item_marker("Qm1"), b"Qm1")?;
                Err(IndexError::InvalidInput("abort".into()))
            })
            .unwrap_err();
        assert!(err.is_precondition_violation());
        assert!(matches!(ds.read_item("Qm1"), Err(IndexError::ItemNotFound(_))));
    }

    #[test]
    fn failed_operation_rolls_back_earlier_steps() {
        let ds = Datastore::in_memory();
        ds.create_or_update_collection(&Collection::new("test.com", "Test", ""))
            .unwrap();
        // The item guard fails after the folder guard passed.
        let err = ds
            .add_item_to_folder("missing", &Folder::root("test.com"))
            .unwrap_err();
        assert!(matches!(err, IndexError::ItemNotFound(_)));
        assert!(ds.is_collection_empty("test.com").unwrap());
    }

    #[test]
    fn clones_share_the_engine() {
        let ds = Datastore::in_memory();
        let other = ds.clone();
        ds.create_or_update_item(&Item::new("Qm1", "one")).unwrap();
        assert_eq!(other.read_item("Qm1").unwrap().name, "one");
    }

    // -----------------------------------------------------------------------
    // Durable backend
    // -----------------------------------------------------------------------

    #[test]
    fn redb_datastore_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::redb(dir.path().join("trove.redb"));

        {
            let ds = Datastore::open(&config).unwrap();
            ds.create_or_update_collection(&Collection::new("test.com", "Test", "Desc"))
                .unwrap();
            ds.create_or_update_item(
                &Item::new("Qm1", "one").with_tags(["a:b".parse::<Tag>().unwrap()]),
            )
            .unwrap();
            ds.add_item_to_collection("Qm1", "test.com").unwrap();
        }

        let ds = Datastore::open(&config).unwrap();
        assert_eq!(ds.read_collection("test.com").unwrap().description, "Desc");
        assert!(ds.is_item_in_collection("Qm1", "test.com").unwrap());
        assert_eq!(ds.read_tag_item_count(&["a:b".parse::<Tag>().unwrap()]).unwrap(), vec![1]);
    }
}
