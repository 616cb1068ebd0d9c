//! Keyspace constants and key-builder functions for §6.3 of the spec.
//!
//! All keys are ASCII, prefix-delimited. Builders return owned `Vec<u8>` so
//! callers never have to reason about borrow lifetimes across a `Txn`.

pub const OWNER: &str = "OWNER_";
pub const GOVERNANCE: &str = "GOVERNANCE_";
pub const CONTRACT_STATE: &str = "CONTRACT_STATE_";
pub const CONSENSUS_NODES: &str = "CONSENSUS_NODES";
pub const PARTITION_NODES: &str = "PARTITION_NODES";
pub const EDGE_NODES: &str = "EDGE_NODES";
pub const GLOBAL_THREAT_LIST: &str = "GLOBAL_THREAT_LIST_";

pub fn node(address: &str) -> Vec<u8> {
    format!("NODE_{address}").into_bytes()
}

pub fn node_id_to_addr(node_id: &str) -> Vec<u8> {
    format!("NODEID_TO_ADDR_{node_id}").into_bytes()
}

pub fn pending_withdrawal(address: &str) -> Vec<u8> {
    format!("PENDING_WITHDRAWAL_{address}").into_bytes()
}

pub fn used_nonce(digest: &str) -> Vec<u8> {
    format!("USED_NONCE_{digest}").into_bytes()
}

pub fn validator(address: &str) -> Vec<u8> {
    format!("VALIDATOR_{address}").into_bytes()
}

pub fn threat_attestation(id: &str) -> Vec<u8> {
    format!("THREAT_ATTESTATION_{id}").into_bytes()
}

pub fn threat_verification(id: &str, verifier: &str) -> Vec<u8> {
    format!("THREAT_VERIFICATION_{id}_{verifier}").into_bytes()
}

pub fn threat_duplicate(source_ip: &str, threat_type: &str, bucket: u64) -> Vec<u8> {
    format!("THREAT_DUPLICATE_{source_ip}_{threat_type}_{bucket}").into_bytes()
}
