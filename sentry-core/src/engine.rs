//! Lifecycle entry points (§4.1, §6.1): `init` and `invoke`.

use crate::config::EngineConfig;
use crate::context::SignatureVerifier;
use crate::dispatch::{self, ArgMap, InvokeOutcome, Rctx};
use crate::error::Result;
use crate::event::{self, EventSink};
use crate::governance::ContractState;
use sentry_store::{keys, Store};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// The in-process unit a host embeds: owns a store handle and the two
/// external collaborators (§1's "out of scope" signature verifier and event
/// sink), and exposes `init`/`invoke` over the opaque argument map.
pub struct Engine {
    store: Store,
    verifier: Arc<dyn SignatureVerifier>,
    sink: Arc<dyn EventSink>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        store: Store,
        verifier: Arc<dyn SignatureVerifier>,
        sink: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Self {
        Engine {
            store,
            verifier,
            sink,
            config,
        }
    }

    /// One-time: sets owner (the caller), governance (explicit or defaulted
    /// to the caller), empty tier lists, and contract state Active (§6.1).
    pub fn init(&self, caller: &str, governance_address: Option<&str>) -> Result<()> {
        tracing::info!(target: "sentry_core", %caller, "initializing engine");
        let mut txn = self.store.transaction();
        txn.put(keys::OWNER.as_bytes(), caller.as_bytes());
        let governance = governance_address.unwrap_or(caller);
        txn.put(keys::GOVERNANCE.as_bytes(), governance.as_bytes());
        txn.put(
            keys::CONTRACT_STATE.as_bytes(),
            ContractState::Active.ordinal().to_string().as_bytes(),
        );
        txn.put(keys::CONSENSUS_NODES.as_bytes(), b"[]");
        txn.put(keys::PARTITION_NODES.as_bytes(), b"[]");
        txn.put(keys::EDGE_NODES.as_bytes(), b"[]");
        Ok(txn.commit()?)
    }

    /// Runs one invocation at the current wall-clock time.
    pub fn invoke(&self, caller: &str, args: &ArgMap) -> InvokeOutcome {
        self.invoke_at(caller, args, now_secs())
    }

    /// Runs one invocation as of `now`, for deterministic tests (§8.3's
    /// scenarios depend on an exact duplicate-suppression window boundary).
    ///
    /// Opens exactly one `Txn`, threads it through the dispatcher, and
    /// commits iff the handler returned `Ok` (§5.1): any error drops the
    /// transaction unused, discarding its buffered writes. Events the
    /// handler raised are buffered alongside the writes and only flushed to
    /// the sink once `commit` has returned `Ok` (§5: writes and emitted
    /// events are discarded together on abort).
    pub fn invoke_at(&self, caller: &str, args: &ArgMap, now: u64) -> InvokeOutcome {
        tracing::debug!(target: "sentry_core", %caller, method = ?args.get("method"), "invoke");
        let mut txn = self.store.transaction();
        let mut events = Vec::new();
        let mut rctx = Rctx {
            txn: &mut txn,
            config: &self.config,
            verifier: self.verifier.as_ref(),
            events: &mut events,
            caller: caller.to_string(),
            now,
        };
        let outcome = dispatch::dispatch(&mut rctx, args);
        if outcome.ok {
            if let Err(e) = txn.commit() {
                tracing::warn!(target: "sentry_core", error = %e, "commit failed after successful handler");
                return InvokeOutcome {
                    ok: false,
                    payload: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
            event::flush(events, self.sink.as_ref());
        }
        outcome
    }
}
