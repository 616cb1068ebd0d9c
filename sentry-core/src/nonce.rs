//! Replay-protection nonce register (§4.3): reject a request whose digest
//! over (caller, operation-tag, invocation-timestamp, nonce) was already
//! consumed.

use crate::dispatch::Rctx;
use crate::error::{EngineError, Result};
use sentry_store::keys;

/// Any collision-resistant hash works here (§4.3: "uniqueness, not preimage
/// resistance, is what matters"); `rapidhash` is already the non-cryptographic
/// hash of choice elsewhere in this workspace.
pub fn digest(caller: &str, op_tag: &str, timestamp: u64, nonce: &str) -> String {
    let material = format!("{caller}\0{op_tag}\0{timestamp}\0{nonce}");
    format!("{:016x}", rapidhash::rapidhash(material.as_bytes()))
}

/// Checks the digest against the used-nonce set and inserts it. The nonce
/// set never shrinks (§8.1 invariant 8); this only ever adds a key.
pub fn check_and_consume(rctx: &mut Rctx, op_tag: &str, nonce: &str) -> Result<()> {
    let d = digest(&rctx.caller, op_tag, rctx.now, nonce);
    let key = keys::used_nonce(&d);
    if rctx.txn.exists(&key)? {
        return Err(EngineError::replay());
    }
    rctx.txn.put(&key, b"used");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn digest_is_deterministic_and_sensitive_to_inputs() {
        let a = digest("alice", "stakeNode", 1000, "n1");
        let b = digest("alice", "stakeNode", 1000, "n1");
        assert_eq!(a, b);
        let c = digest("alice", "stakeNode", 1000, "n2");
        assert_ne!(a, c);
    }
}
