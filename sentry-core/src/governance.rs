//! Governance controls (§4.7): contract-state transitions and validator
//! registration.

use crate::dispatch::Rctx;
use crate::error::{EngineError, Result};
use crate::event::Event;
use serde::{Deserialize, Serialize};
use sentry_store::keys;

/// Closed set, §3.6. Serialized as its ordinal (§9: "marshal as their
/// ordinal in JSON to preserve cross-runtime compatibility").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractState {
    Active,
    Paused,
    EmergencyStopped,
}

impl ContractState {
    pub fn ordinal(self) -> u8 {
        match self {
            ContractState::Active => 0,
            ContractState::Paused => 1,
            ContractState::EmergencyStopped => 2,
        }
    }

    pub fn from_ordinal(v: u8) -> Option<Self> {
        match v {
            0 => Some(ContractState::Active),
            1 => Some(ContractState::Paused),
            2 => Some(ContractState::EmergencyStopped),
            _ => None,
        }
    }
}

impl Serialize for ContractState {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for ContractState {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        ContractState::from_ordinal(v)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid contract state: {v}")))
    }
}

pub fn load_contract_state(rctx: &Rctx) -> Result<ContractState> {
    match rctx.txn.get(keys::CONTRACT_STATE.as_bytes())? {
        Some(raw) => {
            let text = String::from_utf8_lossy(&raw);
            let ordinal: u8 = text.parse().map_err(|_| {
                EngineError::StoreError {
                    op: "parse contract state".to_string(),
                    underlying: text.to_string(),
                }
            })?;
            ContractState::from_ordinal(ordinal).ok_or_else(|| EngineError::StoreError {
                op: "parse contract state".to_string(),
                underlying: format!("unknown ordinal {ordinal}"),
            })
        }
        None => Ok(ContractState::Active),
    }
}

pub fn store_contract_state(rctx: &mut Rctx, state: ContractState) {
    rctx.txn.put(
        keys::CONTRACT_STATE.as_bytes(),
        state.ordinal().to_string().as_bytes(),
    );
}

/// Every mutating handler checks this first (§4.1), except `resumeContract`.
pub fn require_active(rctx: &Rctx) -> Result<()> {
    let state = load_contract_state(rctx)?;
    if matches!(state, ContractState::Active) {
        Ok(())
    } else {
        Err(EngineError::state_not_active(state))
    }
}

pub fn pause_contract(rctx: &mut Rctx) -> Result<Vec<u8>> {
    require_active(rctx)?;
    crate::capability::require_governance(rctx.txn, &rctx.caller)?;
    store_contract_state(rctx, ContractState::Paused);
    rctx.emit(Event::ContractPaused { timestamp: rctx.now });
    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

pub fn resume_contract(rctx: &mut Rctx) -> Result<Vec<u8>> {
    crate::capability::require_governance(rctx.txn, &rctx.caller)?;
    store_contract_state(rctx, ContractState::Active);
    rctx.emit(Event::ContractResumed { timestamp: rctx.now });
    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

pub fn add_validator(rctx: &mut Rctx, address: &str) -> Result<Vec<u8>> {
    require_active(rctx)?;
    crate::capability::require_owner(rctx.txn, &rctx.caller)?;
    if address.len() < 10 {
        return Err(EngineError::argument_malformed(
            "validator_address",
            "must be at least 10 characters",
        ));
    }
    rctx.txn.put(&keys::validator(address), b"1");
    rctx.emit(Event::ValidatorAdded {
        address: address.to_string(),
        timestamp: rctx.now,
    });
    Ok(serde_json::to_vec(&serde_json::json!({"success": true}))?)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn ordinal_round_trip() {
        for s in [
            ContractState::Active,
            ContractState::Paused,
            ContractState::EmergencyStopped,
        ] {
            assert_eq!(ContractState::from_ordinal(s.ordinal()), Some(s));
        }
    }
}
