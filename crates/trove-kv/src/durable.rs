//! Durable engine backed by [redb](https://docs.rs/redb).
//!
//! Every key lives in one redb table of `&[u8] -> &[u8]`. redb provides the
//! transaction model this crate promises: one writer, MVCC readers, and
//! crash-safe commits.

use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::info;

use crate::error::KvResult;
use crate::traits::{KvEngine, KvPair, ReadTxn, WriteTxn};

const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("trove_kv");

/// A redb database file used as a [`KvEngine`].
pub struct RedbKv {
    db: Database,
    path: PathBuf,
}

impl RedbKv {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> KvResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path).map_err(redb::Error::from)?;

        // Make sure the table exists so read transactions can always open it.
        let txn = db.begin_write().map_err(redb::Error::from)?;
        {
            txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        }
        txn.commit().map_err(redb::Error::from)?;

        info!(path = %path.display(), "redb engine opened");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RedbKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbKv").field("path", &self.path).finish()
    }
}

impl KvEngine for RedbKv {
    fn begin_read(&self) -> KvResult<Box<dyn ReadTxn + '_>> {
        let txn = self.db.begin_read().map_err(redb::Error::from)?;
        Ok(Box::new(RedbReadTxn { txn }))
    }

    fn begin_write(&self) -> KvResult<Box<dyn WriteTxn + '_>> {
        let txn = self.db.begin_write().map_err(redb::Error::from)?;
        Ok(Box::new(RedbWriteTxn { txn }))
    }
}

fn get_from<T: ReadableTable<&'static [u8], &'static [u8]>>(
    table: &T,
    key: &[u8],
) -> KvResult<Option<Vec<u8>>> {
    let value = table
        .get(key)
        .map_err(redb::Error::from)?
        .map(|guard| guard.value().to_vec());
    Ok(value)
}

fn scan_from<T: ReadableTable<&'static [u8], &'static [u8]>>(
    table: &T,
    prefix: &[u8],
) -> KvResult<Vec<KvPair>> {
    let mut pairs = Vec::new();
    for entry in table.range(prefix..).map_err(redb::Error::from)? {
        let (key, value) = entry.map_err(redb::Error::from)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        pairs.push((key.to_vec(), value.value().to_vec()));
    }
    Ok(pairs)
}

fn has_prefix_in<T: ReadableTable<&'static [u8], &'static [u8]>>(
    table: &T,
    prefix: &[u8],
) -> KvResult<bool> {
    match table.range(prefix..).map_err(redb::Error::from)?.next() {
        Some(entry) => {
            let (key, _) = entry.map_err(redb::Error::from)?;
            Ok(key.value().starts_with(prefix))
        }
        None => Ok(false),
    }
}

struct RedbReadTxn {
    txn: redb::ReadTransaction,
}

impl ReadTxn for RedbReadTxn {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        get_from(&table, key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        scan_from(&table, prefix)
    }

    fn has_prefix(&self, prefix: &[u8]) -> KvResult<bool> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        has_prefix_in(&table, prefix)
    }
}

struct RedbWriteTxn {
    txn: redb::WriteTransaction,
}

impl ReadTxn for RedbWriteTxn {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        get_from(&table, key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> KvResult<Vec<KvPair>> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        scan_from(&table, prefix)
    }

    fn has_prefix(&self, prefix: &[u8]) -> KvResult<bool> {
        let table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        has_prefix_in(&table, prefix)
    }
}

impl WriteTxn for RedbWriteTxn {
    fn put(&mut self, key: &[u8], value: &[u8]) -> KvResult<()> {
        let mut table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        table.insert(key, value).map_err(redb::Error::from)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> KvResult<bool> {
        let mut table = self.txn.open_table(KV_TABLE).map_err(redb::Error::from)?;
        let existed = table.remove(key).map_err(redb::Error::from)?.is_some();
        Ok(existed)
    }

    fn commit(self: Box<Self>) -> KvResult<()> {
        self.txn.commit().map_err(redb::Error::from)?;
        Ok(())
    }
}
