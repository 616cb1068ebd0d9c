//! End-to-end scenarios from the membership-and-attestation engine's §8.3
//! test table, run against an in-memory store, an always-accept signature
//! verifier, and a recording event sink.

use sentry_core::{AlwaysValidVerifier, ArgMap, Engine, EngineConfig, Event, EventSink};
use sentry_store::{InMemoryBackend, Store};
use std::sync::{Arc, Mutex};
use test_log::test;

#[derive(Default)]
struct RecordingSink(Mutex<Vec<(String, Vec<String>)>>);

impl EventSink for RecordingSink {
    fn emit(&self, name: &str, fields: &[String]) {
        self.0
            .lock()
            .unwrap()
            .push((name.to_string(), fields.to_vec()));
    }
}

fn engine() -> (Engine, Arc<RecordingSink>) {
    let store = Store::new(InMemoryBackend::new());
    let sink = Arc::new(RecordingSink::default());
    let engine = Engine::new(
        store,
        Arc::new(AlwaysValidVerifier),
        sink.clone(),
        EngineConfig::default(),
    );
    (engine, sink)
}

fn args(pairs: &[(&str, &str)]) -> ArgMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn stake_args(node_id: &str, amount: &str, node_type: &str, nonce: &str) -> ArgMap {
    args(&[
        ("method", "stakeNode"),
        ("node_id", node_id),
        ("amount", amount),
        ("node_type", node_type),
        ("business_license_hash", "LIC0000001"),
        ("filing_number_hash", "FIL0000001"),
        ("nonce", nonce),
        ("data_hash", "deadbeef"),
        ("sm2_signature", "sig"),
    ])
}

#[test]
fn register_root_node() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();

    let out = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_000);
    assert!(out.ok, "{:?}", out.error);

    let info = engine.invoke_at(
        "caller-c",
        &args(&[("method", "getNodeInfo"), ("node_address", "caller-c")]),
        1_001,
    );
    assert!(info.ok);
    let node: serde_json::Value = serde_json::from_slice(&info.payload).unwrap();
    assert_eq!(node["stake_amount"], 10000);
    assert_eq!(node["status"], 1); // Registered
    assert_eq!(node["consensus_flag"], true);

    let stats = engine.invoke_at(
        "anyone",
        &args(&[("method", "getContractStats")]),
        1_002,
    );
    assert!(stats.ok);
    let stats: serde_json::Value = serde_json::from_slice(&stats.payload).unwrap();
    assert_eq!(stats["total_consensus_nodes"], 1);
}

#[test]
fn reject_under_staked_edge_as_root() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();

    let out = engine.invoke_at("caller-c", &stake_args("n1", "5000", "0", "1"), 1_000);
    assert!(!out.ok);
    assert_eq!(
        out.error.unwrap(),
        "insufficient stake amount, required: 10000, provided: 5000"
    );

    let info = engine.invoke_at(
        "caller-c",
        &args(&[("method", "getNodeInfo"), ("node_address", "caller-c")]),
        1_001,
    );
    let payload: serde_json::Value = serde_json::from_slice(&info.payload).unwrap();
    assert_eq!(payload["success"], false);
}

#[test]
fn duplicate_node_id_is_rejected() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    let out = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_000);
    assert!(out.ok);

    let out2 = engine.invoke_at("caller-c2", &stake_args("n1", "10000", "0", "1"), 1_001);
    assert!(!out2.ok);
    assert_eq!(out2.error.unwrap(), "node ID already exists: n1");
}

#[test]
fn caller_already_owning_a_node_cannot_register_a_second() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    let out = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_000);
    assert!(out.ok);

    // Same caller, fresh node_id, different tier: must not land the address
    // in a second tier list.
    let out2 = engine.invoke_at("caller-c", &stake_args("n2", "100", "2", "2"), 1_001);
    assert!(!out2.ok);
    assert_eq!(
        out2.error.unwrap(),
        "caller already owns a node record: caller-c"
    );

    let stats = engine.invoke_at("anyone", &args(&[("method", "getContractStats")]), 1_002);
    let stats: serde_json::Value = serde_json::from_slice(&stats.payload).unwrap();
    assert_eq!(stats["total_consensus_nodes"], 1);
    assert_eq!(stats["total_edge_nodes"], 0);
}

#[test]
fn consensus_cap_is_enforced_at_twenty_one() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();

    for i in 0..21 {
        let caller = format!("caller-{i}");
        let node_id = format!("n{i}");
        let out = engine.invoke_at(
            &caller,
            &stake_args(&node_id, "10000", "0", &i.to_string()),
            1_000 + i as u64,
        );
        assert!(out.ok, "node {i} should register: {:?}", out.error);
    }

    let out = engine.invoke_at(
        "caller-21",
        &stake_args("n21", "10000", "0", "21"),
        1_100,
    );
    assert!(!out.ok);
    assert_eq!(out.error.unwrap(), "max consensus nodes reached: 21");
}

fn register_active_node(engine: &Engine, caller: &str, node_id: &str, now: u64) {
    let out = engine.invoke_at(caller, &stake_args(node_id, "100", "2", node_id), now);
    assert!(out.ok, "{:?}", out.error);
}

fn register_validator(engine: &Engine, owner: &str, validator: &str, now: u64) {
    let out = engine.invoke_at(
        owner,
        &args(&[("method", "addValidator"), ("validator_address", validator)]),
        now,
    );
    assert!(out.ok, "{:?}", out.error);
}

#[test]
fn submit_and_verify_threat_report() {
    let (engine, sink) = engine();
    engine.init("governance", None).unwrap();
    register_active_node(&engine, "agent-a", "agent_node", 1_000);
    register_validator(&engine, "governance", "validator_one_", 1_001);
    register_validator(&engine, "governance", "validator_two_", 1_002);
    register_validator(&engine, "governance", "validator_three", 1_003);

    let submit = engine.invoke_at(
        "agent-a",
        &args(&[
            ("method", "submitThreatReport"),
            ("threat_type", "ddos"),
            ("source_ip", "1.2.3.4"),
            ("target_ip", "5.6.7.8"),
            ("threat_level", "Critical"),
            ("context", "observed flood"),
        ]),
        2_000,
    );
    assert!(submit.ok, "{:?}", submit.error);
    let payload: serde_json::Value = serde_json::from_slice(&submit.payload).unwrap();
    let id = payload["id"].as_str().unwrap().to_string();

    let global = engine.invoke_at(
        "anyone",
        &args(&[("method", "getGlobalThreatList")]),
        2_001,
    );
    let list: serde_json::Value = serde_json::from_slice(&global.payload).unwrap();
    assert_eq!(list[0]["ip"], "1.2.3.4");
    assert_eq!(list[0]["level"], 2); // Critical

    for validator in ["validator_one_", "validator_two_", "validator_three"] {
        let out = engine.invoke_at(
            validator,
            &args(&[("method", "verifyThreatReport"), ("report_id", &id)]),
            2_002,
        );
        assert!(out.ok, "{:?}", out.error);
    }

    let info = engine.invoke_at(
        "anyone",
        &args(&[("method", "getNodeInfo"), ("node_address", "agent-a")]),
        2_003,
    );
    let node: serde_json::Value = serde_json::from_slice(&info.payload).unwrap();
    assert_eq!(node["reputation"], 115); // 100 + 3*5
    assert_eq!(node["verified_threats"], 3);

    let events = sink.0.lock().unwrap();
    assert!(events.iter().any(|(name, _)| name == "ThreatReported"));
    assert_eq!(
        events.iter().filter(|(name, _)| name == "ThreatVerified").count(),
        3
    );
}

#[test]
fn duplicate_suppression_window_blocks_then_allows() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    register_active_node(&engine, "agent-a", "agent_node", 1_000);

    let first = engine.invoke_at(
        "agent-a",
        &args(&[
            ("method", "submitThreatReport"),
            ("threat_type", "ddos"),
            ("source_ip", "1.2.3.4"),
            ("target_ip", "5.6.7.8"),
            ("threat_level", "Warning"),
            ("context", "first"),
        ]),
        10_000,
    );
    assert!(first.ok);

    let second = engine.invoke_at(
        "agent-a",
        &args(&[
            ("method", "submitThreatReport"),
            ("threat_type", "ddos"),
            ("source_ip", "1.2.3.4"),
            ("target_ip", "5.6.7.8"),
            ("threat_level", "Warning"),
            ("context", "second"),
        ]),
        10_100,
    );
    assert!(!second.ok);
    assert_eq!(second.error.unwrap(), "duplicate threat report detected");

    let third = engine.invoke_at(
        "agent-a",
        &args(&[
            ("method", "submitThreatReport"),
            ("threat_type", "ddos"),
            ("source_ip", "1.2.3.4"),
            ("target_ip", "5.6.7.8"),
            ("threat_level", "Warning"),
            ("context", "third"),
        ]),
        10_301,
    );
    assert!(third.ok, "{:?}", third.error);
}

#[test]
fn slash_removes_from_consensus() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    let out = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_000);
    assert!(out.ok);

    let slash = engine.invoke_at(
        "governance",
        &args(&[
            ("method", "slashNode"),
            ("node_address", "caller-c"),
            ("reason", "misbehavior"),
        ]),
        1_001,
    );
    assert!(slash.ok, "{:?}", slash.error);

    let info = engine.invoke_at(
        "anyone",
        &args(&[("method", "getNodeInfo"), ("node_address", "caller-c")]),
        1_002,
    );
    let node: serde_json::Value = serde_json::from_slice(&info.payload).unwrap();
    assert_eq!(node["consensus_flag"], false);
    assert_eq!(node["stake_amount"], 0);

    let stats = engine.invoke_at("anyone", &args(&[("method", "getContractStats")]), 1_003);
    let stats: serde_json::Value = serde_json::from_slice(&stats.payload).unwrap();
    assert_eq!(stats["total_consensus_nodes"], 0);
}

#[test]
fn stats_are_zero_immediately_after_init() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    let stats = engine.invoke_at("anyone", &args(&[("method", "getContractStats")]), 1_000);
    let stats: serde_json::Value = serde_json::from_slice(&stats.payload).unwrap();
    assert_eq!(stats["total_staked"], 0);
    assert_eq!(stats["active_nodes"], 0);
    assert_eq!(stats["total_consensus_nodes"], 0);
    assert_eq!(stats["total_partition_nodes"], 0);
    assert_eq!(stats["total_edge_nodes"], 0);
}

#[test]
fn paused_contract_blocks_mutations_except_resume() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();

    let pause = engine.invoke_at(
        "governance",
        &args(&[("method", "pauseContract")]),
        1_000,
    );
    assert!(pause.ok);

    let stake = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_001);
    assert!(!stake.ok);
    assert_eq!(
        stake.error.unwrap(),
        "contract is not active, current state: 1"
    );

    let resume = engine.invoke_at(
        "governance",
        &args(&[("method", "resumeContract")]),
        1_002,
    );
    assert!(resume.ok);

    let stake2 = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_003);
    assert!(stake2.ok, "{:?}", stake2.error);
}

#[test]
fn replaying_a_nonce_is_rejected_with_no_state_delta() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();

    let payload = stake_args("n1", "10000", "0", "same-nonce");
    let out = engine.invoke_at("caller-c", &payload, 1_000);
    assert!(out.ok);

    // Exact replay: same caller, same args, same invocation timestamp.
    let replay = engine.invoke_at("caller-c", &payload, 1_000);
    assert!(!replay.ok);
    assert_eq!(replay.error.unwrap(), "nonce already used");

    let stats = engine.invoke_at("anyone", &args(&[("method", "getContractStats")]), 1_001);
    let stats: serde_json::Value = serde_json::from_slice(&stats.payload).unwrap();
    assert_eq!(stats["total_consensus_nodes"], 1);
}

#[test]
fn failed_invocation_emits_no_events() {
    let (engine, sink) = engine();
    engine.init("governance", None).unwrap();

    let out = engine.invoke_at("caller-c", &stake_args("n1", "5000", "0", "1"), 1_000);
    assert!(!out.ok);
    assert!(sink.0.lock().unwrap().is_empty());

    let out2 = engine.invoke_at("caller-c", &stake_args("n1", "10000", "0", "1"), 1_001);
    assert!(out2.ok, "{:?}", out2.error);
    assert_eq!(
        sink.0.lock().unwrap().iter().filter(|(n, _)| n == "NodeStaked").count(),
        1
    );
}

#[test]
fn unknown_method_is_rejected() {
    let (engine, _sink) = engine();
    engine.init("governance", None).unwrap();
    let out = engine.invoke_at("anyone", &args(&[("method", "doesNotExist")]), 1_000);
    assert!(!out.ok);
    assert_eq!(out.error.unwrap(), "unknown method");
}
