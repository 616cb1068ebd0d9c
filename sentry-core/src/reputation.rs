//! Reputation engine (§4.5): bounded additive update plus derived tier
//! effects.

use crate::dispatch::Rctx;
use crate::error::Result;
use crate::event::Event;
use crate::node::{self, Tier};

pub fn update_reputation(rctx: &mut Rctx, address: &str, delta: i64) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    crate::capability::require_validator(rctx.txn, &rctx.caller)?;

    let mut node = node::require_node(rctx, address)?;
    let new = (node.reputation + delta).clamp(rctx.config.reputation_min, rctx.config.reputation_max);
    node.reputation = new;

    // §9: the source's gap (flag cleared, list not pruned) is closed here:
    // both the flag and the consensus list are updated together.
    if new < rctx.config.reputation_consensus_floor && node.consensus_flag {
        node.consensus_flag = false;
        let mut list = node::load_tier_list(rctx, Tier::Consensus)?;
        list.retain(|a| a != address);
        node::store_tier_list(rctx, Tier::Consensus, &list)?;
    }

    node::store_node(rctx, &node)?;

    rctx.emit(Event::ReputationUpdated {
        address: address.to_string(),
        delta,
        new,
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"success": true, "reputation": new}))?)
}
