//! Node registry (§3.1–§3.3): node records, the node-id→address index, and
//! the three tier lists.

use crate::dispatch::Rctx;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use sentry_store::{keys, Txn};

/// Closed set, §3.2. Ordinal-serialized, like `ContractState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Unregistered,
    Registered,
    Active,
    Slashed,
    PendingRemoval,
    ThreatDetected,
    Verified,
}

impl NodeStatus {
    pub fn ordinal(self) -> u8 {
        match self {
            NodeStatus::Unregistered => 0,
            NodeStatus::Registered => 1,
            NodeStatus::Active => 2,
            NodeStatus::Slashed => 3,
            NodeStatus::PendingRemoval => 4,
            NodeStatus::ThreatDetected => 5,
            NodeStatus::Verified => 6,
        }
    }

    pub fn from_ordinal(v: u8) -> Option<Self> {
        match v {
            0 => Some(NodeStatus::Unregistered),
            1 => Some(NodeStatus::Registered),
            2 => Some(NodeStatus::Active),
            3 => Some(NodeStatus::Slashed),
            4 => Some(NodeStatus::PendingRemoval),
            5 => Some(NodeStatus::ThreatDetected),
            6 => Some(NodeStatus::Verified),
            _ => None,
        }
    }
}

impl Serialize for NodeStatus {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for NodeStatus {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        NodeStatus::from_ordinal(v)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid node status: {v}")))
    }
}

/// §3.1's deployment-type tag. Nodes registered through `stakeNode` only ever
/// reach `Consensus` or `Edge` (see `Tier::deployment_type`); `Intelligence`
/// is reserved for the advisory risk-scoring surface, out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentType {
    Edge,
    Consensus,
    Intelligence,
}

impl DeploymentType {
    pub fn ordinal(self) -> u8 {
        match self {
            DeploymentType::Edge => 0,
            DeploymentType::Consensus => 1,
            DeploymentType::Intelligence => 2,
        }
    }

    pub fn from_ordinal(v: u8) -> Option<Self> {
        match v {
            0 => Some(DeploymentType::Edge),
            1 => Some(DeploymentType::Consensus),
            2 => Some(DeploymentType::Intelligence),
            _ => None,
        }
    }
}

impl Serialize for DeploymentType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for DeploymentType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        DeploymentType::from_ordinal(v)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid deployment type: {v}")))
    }
}

/// The `node_type` registration argument (§4.4): 0 is root/consensus, 1 is
/// partition, anything else is edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Consensus,
    Partition,
    Edge,
}

impl Tier {
    pub fn from_node_type(node_type: u64) -> Self {
        match node_type {
            0 => Tier::Consensus,
            1 => Tier::Partition,
            _ => Tier::Edge,
        }
    }

    pub fn list_key(self) -> &'static str {
        match self {
            Tier::Consensus => keys::CONSENSUS_NODES,
            Tier::Partition => keys::PARTITION_NODES,
            Tier::Edge => keys::EDGE_NODES,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Consensus => "consensus",
            Tier::Partition => "partition",
            Tier::Edge => "edge",
        }
    }

    pub fn deployment_type(self) -> DeploymentType {
        match self {
            Tier::Consensus => DeploymentType::Consensus,
            Tier::Partition | Tier::Edge => DeploymentType::Edge,
        }
    }

    pub fn min_stake(self, config: &crate::config::EngineConfig) -> u64 {
        match self {
            Tier::Consensus => config.min_stake_root,
            Tier::Partition => config.min_stake_partition,
            Tier::Edge => config.min_stake_edge,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub address: String,
    pub node_id: String,
    pub stake_amount: u64,
    pub stake_start: u64,
    pub reputation: i64,
    pub status: NodeStatus,
    pub business_license_hash: String,
    pub filing_number_hash: String,
    pub challenge_total: u64,
    pub challenge_won: u64,
    pub challenge_lost: u64,
    pub last_seen: u64,
    pub consensus_flag: bool,
    pub threat_sensor: bool,
    pub agent_version: String,
    pub deployment_type: DeploymentType,
    pub last_threat_report: u64,
    pub threat_score: u64,
    pub verified_threats: u64,
    pub compliance_zone: String,
}

pub fn load_node_raw(txn: &Txn, address: &str) -> Result<Option<Node>> {
    match txn.get(&keys::node(address))? {
        Some(raw) => {
            let node: Node = serde_json::from_slice(&raw).map_err(|e| EngineError::StoreError {
                op: "parse node record".to_string(),
                underlying: e.to_string(),
            })?;
            Ok(Some(node))
        }
        None => Ok(None),
    }
}

pub fn load_node(rctx: &Rctx, address: &str) -> Result<Option<Node>> {
    load_node_raw(rctx.txn, address)
}

pub fn require_node(rctx: &Rctx, address: &str) -> Result<Node> {
    load_node(rctx, address)?.ok_or_else(|| EngineError::not_found("node not found"))
}

pub fn store_node(rctx: &mut Rctx, node: &Node) -> Result<()> {
    let raw = serde_json::to_vec(node)?;
    rctx.txn.put(&keys::node(&node.address), &raw);
    Ok(())
}

pub fn load_tier_list(rctx: &Rctx, tier: Tier) -> Result<Vec<String>> {
    match rctx.txn.get(tier.list_key().as_bytes())? {
        Some(raw) => Ok(serde_json::from_slice(&raw).map_err(|e| EngineError::StoreError {
            op: "parse tier list".to_string(),
            underlying: e.to_string(),
        })?),
        None => Ok(Vec::new()),
    }
}

pub fn store_tier_list(rctx: &mut Rctx, tier: Tier, list: &[String]) -> Result<()> {
    let raw = serde_json::to_vec(list)?;
    rctx.txn.put(tier.list_key().as_bytes(), &raw);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn status_ordinal_round_trip() {
        for s in [
            NodeStatus::Unregistered,
            NodeStatus::Registered,
            NodeStatus::Active,
            NodeStatus::Slashed,
            NodeStatus::PendingRemoval,
            NodeStatus::ThreatDetected,
            NodeStatus::Verified,
        ] {
            assert_eq!(NodeStatus::from_ordinal(s.ordinal()), Some(s));
        }
    }

    #[test]
    fn tier_from_node_type() {
        assert_eq!(Tier::from_node_type(0), Tier::Consensus);
        assert_eq!(Tier::from_node_type(1), Tier::Partition);
        assert_eq!(Tier::from_node_type(2), Tier::Edge);
        assert_eq!(Tier::from_node_type(99), Tier::Edge);
    }
}
