//! Staking lifecycle (§4.4): register, withdraw, slash.

use crate::capability;
use crate::dispatch::Rctx;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::node::{self, DeploymentType, Node, NodeStatus, Tier};
use crate::nonce;
use sentry_store::keys;

#[allow(clippy::too_many_arguments)]
pub fn stake_node(
    rctx: &mut Rctx,
    node_id: &str,
    amount: u64,
    node_type: u64,
    business_license_hash: &str,
    filing_number_hash: &str,
    nonce_value: &str,
    data_hash: &str,
    signature: &str,
) -> Result<Vec<u8>> {
    // §4.4 steps 1-3: contract state, then replay guard, then signature.
    crate::governance::require_active(rctx)?;
    nonce::check_and_consume(rctx, "stakeNode", nonce_value)?;
    if !rctx.verifier.verify(&rctx.caller, data_hash, signature) {
        return Err(EngineError::signature_invalid());
    }

    let tier = Tier::from_node_type(node_type);
    let minimum = tier.min_stake(rctx.config);
    if amount < minimum {
        return Err(EngineError::policy_violation(format!(
            "insufficient stake amount, required: {minimum}, provided: {amount}"
        )));
    }

    if rctx.txn.exists(&keys::node_id_to_addr(node_id))? {
        return Err(EngineError::duplicate(format!(
            "node ID already exists: {node_id}"
        )));
    }
    if rctx.txn.exists(&keys::node(&rctx.caller))? {
        return Err(EngineError::duplicate(format!(
            "caller already owns a node record: {}",
            rctx.caller
        )));
    }

    if business_license_hash.len() < 10 {
        return Err(EngineError::argument_malformed(
            "business_license_hash",
            "must be at least 10 characters",
        ));
    }
    if filing_number_hash.len() < 10 {
        return Err(EngineError::argument_malformed(
            "filing_number_hash",
            "must be at least 10 characters",
        ));
    }

    let mut list = node::load_tier_list(rctx, tier)?;
    if tier == Tier::Consensus && list.len() >= rctx.config.consensus_cap {
        return Err(EngineError::policy_violation(format!(
            "max consensus nodes reached: {}",
            rctx.config.consensus_cap
        )));
    }
    if list.iter().any(|a| a == &rctx.caller) {
        return Err(EngineError::duplicate(format!(
            "node already in {} list",
            tier.name()
        )));
    }

    let node = Node {
        address: rctx.caller.clone(),
        node_id: node_id.to_string(),
        stake_amount: amount,
        stake_start: rctx.now,
        reputation: rctx.config.reputation_initial,
        status: NodeStatus::Registered,
        business_license_hash: business_license_hash.to_string(),
        filing_number_hash: filing_number_hash.to_string(),
        challenge_total: 0,
        challenge_won: 0,
        challenge_lost: 0,
        last_seen: rctx.now,
        consensus_flag: tier == Tier::Consensus,
        threat_sensor: false,
        agent_version: String::new(),
        deployment_type: tier.deployment_type(),
        last_threat_report: 0,
        threat_score: 0,
        verified_threats: 0,
        compliance_zone: String::new(),
    };
    node::store_node(rctx, &node)?;
    rctx.txn
        .put(&keys::node_id_to_addr(node_id), rctx.caller.as_bytes());

    list.push(rctx.caller.clone());
    node::store_tier_list(rctx, tier, &list)?;

    rctx.emit(Event::NodeStaked {
        node_id: node_id.to_string(),
        caller: rctx.caller.clone(),
        amount,
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

pub fn request_withdrawal(rctx: &mut Rctx, amount: u64) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    let mut node = capability::require_node_owner(rctx.txn, &rctx.caller)?;

    if matches!(node.status, NodeStatus::Slashed) {
        return Err(EngineError::policy_violation(
            "slashed nodes cannot withdraw",
        ));
    }
    if rctx.now < node.stake_start + rctx.config.lock_period_secs {
        return Err(EngineError::policy_violation("lock period not ended"));
    }
    if amount > node.stake_amount {
        return Err(EngineError::policy_violation(format!(
            "insufficient stake amount, required: {amount}, provided: {}",
            node.stake_amount
        )));
    }

    node.stake_amount -= amount;
    node::store_node(rctx, &node)?;

    let pending_key = keys::pending_withdrawal(&rctx.caller);
    let current: u64 = match rctx.txn.get(&pending_key)? {
        Some(raw) => String::from_utf8_lossy(&raw)
            .parse()
            .map_err(|_| EngineError::StoreError {
                op: "parse pending withdrawal".to_string(),
                underlying: "not an integer".to_string(),
            })?,
        None => 0,
    };
    rctx.txn
        .put(&pending_key, (current + amount).to_string().as_bytes());

    rctx.emit(Event::WithdrawalRequested {
        caller: rctx.caller.clone(),
        amount,
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

pub fn slash_node(rctx: &mut Rctx, address: &str, reason: &str) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    crate::capability::require_governance(rctx.txn, &rctx.caller)?;

    let mut node = node::require_node(rctx, address)?;
    let penalty = node.stake_amount * rctx.config.slash_rate_pct / 100;
    node.stake_amount -= penalty;
    node.status = NodeStatus::Slashed;

    if node.consensus_flag {
        node.consensus_flag = false;
        node.deployment_type = DeploymentType::Edge;
        let mut list = node::load_tier_list(rctx, Tier::Consensus)?;
        list.retain(|a| a != address);
        node::store_tier_list(rctx, Tier::Consensus, &list)?;
    }
    node::store_node(rctx, &node)?;

    rctx.emit(Event::NodeSlashed {
        address: address.to_string(),
        penalty,
        reason: reason.to_string(),
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

pub fn submit_challenge(rctx: &mut Rctx, cache_key: &str, reason: &str) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    let mut node = capability::require_active_node(rctx.txn, &rctx.caller)?;
    node.challenge_total += 1;
    node::store_node(rctx, &node)?;

    rctx.emit(Event::NodeChallenged {
        caller: rctx.caller.clone(),
        cache_key: cache_key.to_string(),
        reason: reason.to_string(),
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}
