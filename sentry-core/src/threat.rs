//! Threat attestation store (§4.6, §3.4, §3.5).

use crate::dispatch::Rctx;
use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::node;
use serde::{Deserialize, Serialize};
use sentry_store::keys;

/// Closed set, §3.4. Ordinal-serialized, like `NodeStatus`/`ContractState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ThreatLevel {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl ThreatLevel {
    pub fn ordinal(self) -> u8 {
        match self {
            ThreatLevel::Info => 0,
            ThreatLevel::Warning => 1,
            ThreatLevel::Critical => 2,
            ThreatLevel::Emergency => 3,
        }
    }

    pub fn from_ordinal(v: u8) -> Option<Self> {
        match v {
            0 => Some(ThreatLevel::Info),
            1 => Some(ThreatLevel::Warning),
            2 => Some(ThreatLevel::Critical),
            3 => Some(ThreatLevel::Emergency),
            _ => None,
        }
    }

    pub fn parse_name(name: &str) -> Option<Self> {
        match name {
            "Info" => Some(ThreatLevel::Info),
            "Warning" => Some(ThreatLevel::Warning),
            "Critical" => Some(ThreatLevel::Critical),
            "Emergency" => Some(ThreatLevel::Emergency),
            _ => None,
        }
    }
}

impl Serialize for ThreatLevel {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for ThreatLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let v = u8::deserialize(d)?;
        ThreatLevel::from_ordinal(v)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid threat level: {v}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAttestation {
    pub id: String,
    pub timestamp: u64,
    pub source_ip: String,
    pub target_ip: String,
    pub threat_type: String,
    pub threat_level: ThreatLevel,
    pub context: String,
    pub agent_address: String,
    pub evidence_hash: Option<String>,
    pub geolocation: Option<String>,
    pub network_flow: Option<String>,
    pub verified: bool,
    pub verification_count: u32,
    pub compliance_tag: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalThreatEntry {
    pub ip: String,
    pub level: ThreatLevel,
    pub first_seen: u64,
    pub last_seen: u64,
    pub report_count: u64,
}

/// Each segment is empty (wildcard `x`) or a decimal integer (§4.6.1).
fn validate_dotted_quad(name: &str, value: &str) -> Result<()> {
    for segment in value.split('.') {
        if segment.is_empty() || segment == "x" {
            continue;
        }
        if segment.parse::<u32>().is_err() {
            return Err(EngineError::argument_malformed(
                name,
                format!("segment '{segment}' is not a wildcard or integer"),
            ));
        }
    }
    Ok(())
}

pub fn submit_threat_report(
    rctx: &mut Rctx,
    threat_type: &str,
    source_ip: &str,
    target_ip: &str,
    threat_level_name: &str,
    context: &str,
    evidence_hash: Option<String>,
    geolocation: Option<String>,
    network_flow: Option<String>,
) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    let reporter = crate::capability::require_active_node(rctx.txn, &rctx.caller)?;

    validate_dotted_quad("source_ip", source_ip)?;
    validate_dotted_quad("target_ip", target_ip)?;

    let bucket = rctx.now / rctx.config.duplicate_suppression_window_secs;
    let dup_key = keys::threat_duplicate(source_ip, threat_type, bucket);
    if rctx.txn.exists(&dup_key)? {
        return Err(EngineError::duplicate("duplicate threat report detected"));
    }

    let level = ThreatLevel::parse_name(threat_level_name).ok_or_else(|| {
        EngineError::argument_malformed("threat_level", format!("unknown level '{threat_level_name}'"))
    })?;

    rctx.txn.put(&dup_key, b"1");

    let id = format!("threat_{source_ip}_{}", rctx.now);
    let attestation = ThreatAttestation {
        id: id.clone(),
        timestamp: rctx.now,
        source_ip: source_ip.to_string(),
        target_ip: target_ip.to_string(),
        threat_type: threat_type.to_string(),
        threat_level: level,
        context: context.to_string(),
        agent_address: rctx.caller.clone(),
        evidence_hash,
        geolocation,
        network_flow,
        verified: false,
        verification_count: 0,
        compliance_tag: None,
        region: None,
    };
    let raw = serde_json::to_vec(&attestation)?;
    rctx.txn.put(&keys::threat_attestation(&id), &raw);

    let mut reporter = reporter;
    reporter.last_threat_report = rctx.now;
    reporter.challenge_total += 1;
    node::store_node(rctx, &reporter)?;

    if level >= ThreatLevel::Critical {
        upsert_global_threat_list(rctx, source_ip, level)?;
    }

    rctx.emit(Event::ThreatReported {
        id: id.clone(),
        source_ip: source_ip.to_string(),
        target_ip: target_ip.to_string(),
        threat_type: threat_type.to_string(),
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({"id": id}))?)
}

fn load_global_threat_list(rctx: &Rctx) -> Result<Vec<GlobalThreatEntry>> {
    match rctx.txn.get(keys::GLOBAL_THREAT_LIST.as_bytes())? {
        Some(raw) => Ok(serde_json::from_slice(&raw).map_err(|e| EngineError::StoreError {
            op: "parse global threat list".to_string(),
            underlying: e.to_string(),
        })?),
        None => Ok(Vec::new()),
    }
}

/// Failure here MUST propagate (§9: "secondary-update failures must
/// propagate"), rolling back the whole invocation so the attestation store
/// and the global index never diverge.
fn upsert_global_threat_list(rctx: &mut Rctx, source_ip: &str, level: ThreatLevel) -> Result<()> {
    let mut list = load_global_threat_list(rctx)?;
    match list.iter_mut().find(|e| e.ip == source_ip) {
        Some(entry) => {
            if level > entry.level {
                entry.level = level;
            }
            entry.last_seen = rctx.now;
            entry.report_count += 1;
        }
        None => {
            list.push(GlobalThreatEntry {
                ip: source_ip.to_string(),
                level,
                first_seen: rctx.now,
                last_seen: rctx.now,
                report_count: 1,
            });
        }
    }
    let raw = serde_json::to_vec(&list)?;
    rctx.txn.put(keys::GLOBAL_THREAT_LIST.as_bytes(), &raw);
    Ok(())
}

pub fn verify_threat_report(rctx: &mut Rctx, report_id: &str) -> Result<Vec<u8>> {
    crate::governance::require_active(rctx)?;
    crate::capability::require_validator(rctx.txn, &rctx.caller)?;

    let key = keys::threat_attestation(report_id);
    let raw = rctx
        .txn
        .get(&key)?
        .ok_or_else(|| EngineError::not_found("threat report not found"))?;
    let mut attestation: ThreatAttestation =
        serde_json::from_slice(&raw).map_err(|e| EngineError::StoreError {
            op: "parse threat attestation".to_string(),
            underlying: e.to_string(),
        })?;

    let stamp_key = keys::threat_verification(report_id, &rctx.caller);
    if rctx.txn.exists(&stamp_key)? {
        // Idempotent: repeat calls by the same verifier don't double-count.
        return Ok(serde_json::to_vec(&serde_json::json!({
            "id": report_id,
            "verified": attestation.verified,
        }))?);
    }
    rctx.txn.put(&stamp_key, b"1");

    attestation.verification_count += 1;
    attestation.verified = attestation.verification_count >= rctx.config.min_verification_count;
    let raw = serde_json::to_vec(&attestation)?;
    rctx.txn.put(&key, &raw);

    if let Some(mut reporter) = node::load_node(rctx, &attestation.agent_address)? {
        reporter.reputation = (reporter.reputation + rctx.config.reputation_verify_credit)
            .clamp(rctx.config.reputation_min, rctx.config.reputation_max);
        reporter.verified_threats += 1;
        node::store_node(rctx, &reporter)?;
    }

    rctx.emit(Event::ThreatVerified {
        id: report_id.to_string(),
        verifier: rctx.caller.clone(),
        verdict: true,
        timestamp: rctx.now,
    });

    Ok(serde_json::to_vec(&serde_json::json!({
        "id": report_id,
        "verified": attestation.verified,
    }))?)
}

pub fn get_threat_report(rctx: &Rctx, report_id: &str) -> Result<Vec<u8>> {
    match rctx.txn.get(&keys::threat_attestation(report_id))? {
        Some(raw) => Ok(raw),
        None => Ok(serde_json::to_vec(&serde_json::json!({
            "success": false,
            "error": "threat report not found",
        }))?),
    }
}

pub fn get_global_threat_list(rctx: &Rctx) -> Result<Vec<u8>> {
    let list = load_global_threat_list(rctx)?;
    Ok(serde_json::to_vec(&list)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn dotted_quad_accepts_wildcards() {
        assert!(validate_dotted_quad("ip", "1.2.3.4").is_ok());
        assert!(validate_dotted_quad("ip", "1.x.3.x").is_ok());
        assert!(validate_dotted_quad("ip", "1.2.3.").is_ok());
        assert!(validate_dotted_quad("ip", "1.foo.3.4").is_err());
    }

    #[test]
    fn level_ordering_matches_severity() {
        assert!(ThreatLevel::Critical > ThreatLevel::Warning);
        assert!(ThreatLevel::Emergency > ThreatLevel::Critical);
        assert_eq!(ThreatLevel::parse_name("Critical"), Some(ThreatLevel::Critical));
        assert_eq!(ThreatLevel::parse_name("bogus"), None);
    }
}
