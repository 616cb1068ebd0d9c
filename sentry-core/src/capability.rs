//! Identity & capability gate (§4.2): resolves the caller against the
//! owner/governance/validator singletons and the node registry.

use crate::error::{EngineError, Result};
use crate::node::{self, Node, NodeStatus};
use sentry_store::{keys, Txn};

pub fn require_owner(txn: &Txn, caller: &str) -> Result<()> {
    let owner = txn.get(keys::OWNER.as_bytes())?;
    match owner {
        Some(raw) if raw == caller.as_bytes() => Ok(()),
        _ => Err(EngineError::capability_denied("owner", caller)),
    }
}

pub fn require_governance(txn: &Txn, caller: &str) -> Result<()> {
    let governance = txn.get(keys::GOVERNANCE.as_bytes())?;
    match governance {
        Some(raw) if raw == caller.as_bytes() => Ok(()),
        _ => Err(EngineError::capability_denied("governance", caller)),
    }
}

pub fn require_validator(txn: &Txn, caller: &str) -> Result<()> {
    if txn.exists(&keys::validator(caller))? {
        Ok(())
    } else {
        Err(EngineError::capability_denied("validator", caller))
    }
}

/// Caller must own a node record; `stakeNode` hasn't happened for them yet
/// otherwise. Used by `submitChallenge`/`submitThreatReport` (§4.2's
/// "active-node-only") and by `requestWithdrawal`'s ownership check.
pub fn require_node_owner(txn: &Txn, caller: &str) -> Result<Node> {
    node::load_node_raw(txn, caller)?.ok_or_else(|| EngineError::capability_denied("active-node", caller))
}

/// `active-node-only`: the caller must own a node whose status is
/// `Registered` or `Active` (§4.10: "caller must own a Node record whose
/// status is Active or Registered").
pub fn require_active_node(txn: &Txn, caller: &str) -> Result<Node> {
    let node = require_node_owner(txn, caller)?;
    match node.status {
        NodeStatus::Registered | NodeStatus::Active => Ok(node),
        _ => Err(EngineError::capability_denied("active-node", caller)),
    }
}
