//! Typed wrapper over the host key-value store.
//!
//! The spec treats the key-value store as an external collaborator: get/put/delete
//! over opaque byte keys, with serializable-isolation transaction per invocation. This
//! crate supplies that collaborator's shape (the `Store` trait and the `Txn` handle
//! that buffers one invocation's writes) plus two concrete backends: an in-memory one
//! for tests, and a `redb`-backed one for the CLI host.

pub mod keys;
mod memory;
mod redb_backend;

pub use memory::InMemoryBackend;
pub use redb_backend::RedbBackend;

use sentry_base::Result;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One pending mutation inside an open transaction.
#[derive(Clone, Debug)]
enum Write {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// The durable side of a `Store`: reads against committed state, and an atomic
/// apply of a batch of writes. Both `InMemoryBackend` and `RedbBackend` implement
/// this; `Store` is the thin, backend-agnostic façade handlers actually use.
pub trait Backend: Send + Sync {
    fn get_committed(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn scan_prefix_committed(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    fn commit(&self, writes: &[(Vec<u8>, Option<Vec<u8>>)]) -> Result<()>;
}

/// A typed handle over a concrete backend. Cheap to clone (an `Arc` underneath),
/// matching how the engine threads a store handle through a CLI or test harness.
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    pub fn new(backend: impl Backend + 'static) -> Self {
        Store {
            backend: Arc::new(backend),
        }
    }

    /// Open one flat transaction. The spec requires every mutating handler to run
    /// inside exactly one logical transaction per invocation (§5, §5.1): the engine
    /// opens one `Txn` per `invoke` call, passes it through the handler, and commits
    /// it only if the handler returns `Ok`.
    pub fn transaction(&self) -> Txn {
        Txn {
            backend: self.backend.clone(),
            writes: Vec::new(),
        }
    }

    /// Convenience read path outside of any transaction (used by read-only handlers
    /// that don't need write buffering, per §4.1's "public (read)" capability rows).
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.backend.get_committed(key)
    }

    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.backend.scan_prefix_committed(prefix)
    }
}

/// A single invocation's logical transaction. Reads see the transaction's own
/// buffered writes layered over committed state; nothing is visible to any other
/// transaction (there are none concurrently open in this single-threaded-per-
/// invocation model) until `commit` succeeds.
pub struct Txn {
    backend: Arc<dyn Backend>,
    writes: Vec<(Vec<u8>, Write)>,
}

impl Txn {
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        for (k, w) in self.writes.iter().rev() {
            if k == key {
                return Ok(match w {
                    Write::Put(_, v) => Some(v.clone()),
                    Write::Delete(_) => None,
                });
            }
        }
        self.backend.get_committed(key)
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.writes
            .push((key.to_vec(), Write::Put(key.to_vec(), value.to_vec())));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.writes
            .push((key.to_vec(), Write::Delete(key.to_vec())));
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Scan committed state for a prefix, with the transaction's own buffered
    /// writes overlaid (puts overriding/adding, deletes suppressing).
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .backend
            .scan_prefix_committed(prefix)?
            .into_iter()
            .collect();
        for (k, w) in &self.writes {
            if !k.starts_with(prefix) {
                continue;
            }
            match w {
                Write::Put(_, v) => {
                    merged.insert(k.clone(), v.clone());
                }
                Write::Delete(_) => {
                    merged.remove(k);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    /// Apply every buffered write atomically. Consumes `self`: once committed (or
    /// dropped without being committed, which discards the buffer), the handle is
    /// gone, so a handler cannot accidentally keep writing into a transaction that
    /// has already been resolved.
    pub fn commit(self) -> Result<()> {
        let applied: Vec<(Vec<u8>, Option<Vec<u8>>)> = self
            .writes
            .into_iter()
            .map(|(k, w)| match w {
                Write::Put(_, v) => (k, Some(v)),
                Write::Delete(_) => (k, None),
            })
            .collect();
        self.backend.commit(&applied)
    }
}
