//! Read-only query handlers (§4.9, §6.2): `getNodeInfo`, `getContractStats`.
//!
//! Per §7's "user-visible behavior", these return a structured
//! `{success:false, error:"..."}` payload instead of raising, so a read-only
//! call never aborts its caller's larger flow.

use crate::dispatch::Rctx;
use crate::error::Result;
use crate::node::{self, NodeStatus, Tier};

pub fn get_node_info(rctx: &Rctx, address: &str) -> Result<Vec<u8>> {
    match node::load_node(rctx, address)? {
        Some(node) => Ok(serde_json::to_vec(&node)?),
        None => Ok(serde_json::to_vec(&serde_json::json!({
            "success": false,
            "error": "node not found",
        }))?),
    }
}

pub fn get_contract_stats(rctx: &Rctx) -> Result<Vec<u8>> {
    let mut total_staked: u64 = 0;
    let mut active_nodes: u64 = 0;

    let consensus = node::load_tier_list(rctx, Tier::Consensus)?;
    let partition = node::load_tier_list(rctx, Tier::Partition)?;
    let edge = node::load_tier_list(rctx, Tier::Edge)?;

    for address in consensus.iter().chain(partition.iter()).chain(edge.iter()) {
        if let Some(n) = node::load_node(rctx, address)? {
            if matches!(n.status, NodeStatus::Active) {
                active_nodes += 1;
                total_staked += n.stake_amount;
            }
        }
    }

    Ok(serde_json::to_vec(&serde_json::json!({
        "total_staked": total_staked,
        "active_nodes": active_nodes,
        "total_consensus_nodes": consensus.len(),
        "total_partition_nodes": partition.len(),
        "total_edge_nodes": edge.len(),
    }))?)
}
