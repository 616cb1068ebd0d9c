//! Dispatcher (§4.1): parses the string argument map, selects a handler,
//! and returns a payload. Each mutating handler's contract-state and
//! capability checks live with the handler itself (§4.1, §4.2); the
//! dispatcher's job is routing and argument extraction only.

use crate::context::SignatureVerifier;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::governance;
use crate::query;
use crate::reputation;
use crate::staking;
use crate::threat;
use sentry_store::Txn;
use std::collections::HashMap;

/// The opaque string-valued argument map the spec's dispatcher contract
/// takes (§9: "opaque-bytes argument map replaces named function
/// parameters"). Values are plain strings rather than byte blobs since
/// every argument named in §6.2 is either decimal ASCII or free text.
pub type ArgMap = HashMap<String, String>;

pub fn require_arg<'a>(args: &'a ArgMap, name: &str) -> Result<&'a str> {
    args.get(name)
        .map(|s| s.as_str())
        .ok_or_else(|| EngineError::argument_missing(name))
}

pub fn optional_arg<'a>(args: &'a ArgMap, name: &str) -> Option<&'a str> {
    args.get(name).map(|s| s.as_str())
}

pub fn require_u64(args: &ArgMap, name: &str) -> Result<u64> {
    require_arg(args, name)?
        .parse()
        .map_err(|_| EngineError::argument_malformed(name, "expected a non-negative integer"))
}

pub fn require_i64(args: &ArgMap, name: &str) -> Result<i64> {
    require_arg(args, name)?
        .parse()
        .map_err(|_| EngineError::argument_malformed(name, "expected an integer"))
}

/// Bundles everything a handler needs: the open transaction, config,
/// the external collaborators, and the already-resolved caller/timestamp.
/// Grounds the request-scoped "ambient context" idiom the `ioi-network`
/// contracts reach for via free functions like `context::sender()`, adapted
/// here as an explicit struct since this crate has no implicit host context.
pub struct Rctx<'a> {
    pub txn: &'a mut Txn,
    pub config: &'a crate::config::EngineConfig,
    pub verifier: &'a dyn SignatureVerifier,
    /// Events raised so far this invocation. Buffered rather than handed
    /// straight to the sink: the host only flushes this (§5) once `commit`
    /// has succeeded, so a failed commit can never leave an emitted event
    /// with no corresponding committed write.
    pub events: &'a mut Vec<Event>,
    pub caller: String,
    pub now: u64,
}

impl<'a> Rctx<'a> {
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

pub struct InvokeOutcome {
    pub ok: bool,
    pub payload: Vec<u8>,
    pub error: Option<String>,
}

impl InvokeOutcome {
    fn ok(payload: Vec<u8>) -> Self {
        InvokeOutcome {
            ok: true,
            payload,
            error: None,
        }
    }

    fn err(e: EngineError) -> Self {
        InvokeOutcome {
            ok: false,
            payload: Vec::new(),
            error: Some(e.to_string()),
        }
    }
}

/// Runs one `method` dispatch. `rctx.txn` already holds the invocation's
/// single flat transaction (§5.1); the caller commits it iff this returns
/// `Ok`.
pub fn dispatch(rctx: &mut Rctx, args: &ArgMap) -> InvokeOutcome {
    match dispatch_inner(rctx, args) {
        Ok(payload) => InvokeOutcome::ok(payload),
        Err(e) => InvokeOutcome::err(e),
    }
}

fn dispatch_inner(rctx: &mut Rctx, args: &ArgMap) -> Result<Vec<u8>> {
    let method = require_arg(args, "method")?;
    match method {
        "stakeNode" => {
            let node_id = require_arg(args, "node_id")?.to_string();
            let amount = require_u64(args, "amount")?;
            let node_type = require_u64(args, "node_type")?;
            let business_license_hash = require_arg(args, "business_license_hash")?.to_string();
            let filing_number_hash = require_arg(args, "filing_number_hash")?.to_string();
            let nonce_value = require_arg(args, "nonce")?.to_string();
            let data_hash = require_arg(args, "data_hash")?.to_string();
            let signature = require_arg(args, "sm2_signature")?.to_string();
            staking::stake_node(
                rctx,
                &node_id,
                amount,
                node_type,
                &business_license_hash,
                &filing_number_hash,
                &nonce_value,
                &data_hash,
                &signature,
            )
        }
        "getNodeInfo" => {
            let node_address = require_arg(args, "node_address")?;
            query::get_node_info(rctx, node_address)
        }
        "getContractStats" => query::get_contract_stats(rctx),
        "submitChallenge" => {
            let cache_key = require_arg(args, "cache_key")?.to_string();
            let reason = require_arg(args, "reason")?.to_string();
            staking::submit_challenge(rctx, &cache_key, &reason)
        }
        "updateReputation" => {
            let node_address = require_arg(args, "node_address")?.to_string();
            let delta = require_i64(args, "reputation_delta")?;
            reputation::update_reputation(rctx, &node_address, delta)
        }
        "slashNode" => {
            let node_address = require_arg(args, "node_address")?.to_string();
            let reason = require_arg(args, "reason")?.to_string();
            staking::slash_node(rctx, &node_address, &reason)
        }
        "requestWithdrawal" => {
            let amount = require_u64(args, "amount")?;
            staking::request_withdrawal(rctx, amount)
        }
        "addValidator" => {
            let validator_address = require_arg(args, "validator_address")?.to_string();
            governance::add_validator(rctx, &validator_address)
        }
        "pauseContract" => governance::pause_contract(rctx),
        "resumeContract" => governance::resume_contract(rctx),
        "submitThreatReport" => {
            let threat_type = require_arg(args, "threat_type")?.to_string();
            let source_ip = require_arg(args, "source_ip")?.to_string();
            let target_ip = require_arg(args, "target_ip")?.to_string();
            let threat_level = require_arg(args, "threat_level")?.to_string();
            let context = require_arg(args, "context")?.to_string();
            let evidence_hash = optional_arg(args, "evidence_hash").map(str::to_string);
            let geolocation = optional_arg(args, "geolocation").map(str::to_string);
            let network_flow = optional_arg(args, "network_flow").map(str::to_string);
            threat::submit_threat_report(
                rctx,
                &threat_type,
                &source_ip,
                &target_ip,
                &threat_level,
                &context,
                evidence_hash,
                geolocation,
                network_flow,
            )
        }
        "verifyThreatReport" => {
            let report_id = require_arg(args, "report_id")?.to_string();
            threat::verify_threat_report(rctx, &report_id)
        }
        "getThreatReport" => {
            let report_id = require_arg(args, "report_id")?;
            threat::get_threat_report(rctx, report_id)
        }
        "getGlobalThreatList" => threat::get_global_threat_list(rctx),
        _ => Err(EngineError::unknown_method()),
    }
}
