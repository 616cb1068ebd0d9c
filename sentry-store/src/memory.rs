//! In-memory backend used by unit and integration tests: a `Mutex<BTreeMap>` with
//! the whole map swapped in only once a batch of writes has been assembled, which
//! is as close as a plain map gets to the host's serializable-isolation guarantee.

use crate::Backend;
use sentry_base::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryBackend {
    data: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend::default()
    }
}

impl Backend for InMemoryBackend {
    fn get_committed(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn scan_prefix_committed(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .data
            .lock()
            .unwrap()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, writes: &[(Vec<u8>, Option<Vec<u8>>)]) -> Result<()> {
        let mut guard = self.data.lock().unwrap();
        for (k, v) in writes {
            match v {
                Some(v) => {
                    guard.insert(k.clone(), v.clone());
                }
                None => {
                    guard.remove(k);
                }
            }
        }
        Ok(())
    }
}
