//! `redb`-backed durable store for the CLI host harness. `redb` gives us a single
//! embedded file with ACID, serializable-isolation write transactions, which is
//! exactly the guarantee §5 asks the host key-value store to provide.

use crate::Backend;
use redb::{Database, ReadableTable, TableDefinition};
use sentry_base::{err, Result};
use std::path::Path;

const TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("sentry_kv");

pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref()).map_err(|e| err(e.to_string()))?;
        // Ensure the table exists even before the first write, so reads against a
        // freshly-created database don't have to special-case "table missing".
        let write_txn = db.begin_write().map_err(|e| err(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(TABLE)
                .map_err(|e| err(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| err(e.to_string()))?;
        Ok(RedbBackend { db })
    }
}

impl Backend for RedbBackend {
    fn get_committed(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(|e| err(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| err(e.to_string()))?;
        Ok(table
            .get(key)
            .map_err(|e| err(e.to_string()))?
            .map(|v| v.value().to_vec()))
    }

    fn scan_prefix_committed(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let read_txn = self.db.begin_read().map_err(|e| err(e.to_string()))?;
        let table = read_txn
            .open_table(TABLE)
            .map_err(|e| err(e.to_string()))?;
        let mut out = Vec::new();
        for entry in table.range(prefix..).map_err(|e| err(e.to_string()))? {
            let (k, v) = entry.map_err(|e| err(e.to_string()))?;
            if !k.value().starts_with(prefix) {
                break;
            }
            out.push((k.value().to_vec(), v.value().to_vec()));
        }
        Ok(out)
    }

    fn commit(&self, writes: &[(Vec<u8>, Option<Vec<u8>>)]) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(|e| err(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(TABLE)
                .map_err(|e| err(e.to_string()))?;
            for (k, v) in writes {
                match v {
                    Some(v) => {
                        table
                            .insert(k.as_slice(), v.as_slice())
                            .map_err(|e| err(e.to_string()))?;
                    }
                    None => {
                        table
                            .remove(k.as_slice())
                            .map_err(|e| err(e.to_string()))?;
                    }
                }
            }
        }
        write_txn.commit().map_err(|e| err(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Store;
    use test_log::test;

    #[test]
    fn redb_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentry.redb");
        let backend = RedbBackend::open(&path).unwrap();
        let store = Store::new(backend);
        let mut txn = store.transaction();
        txn.put(b"NODE_a", b"hello");
        txn.commit().unwrap();
        assert_eq!(store.get(b"NODE_a").unwrap(), Some(b"hello".to_vec()));
    }
}
