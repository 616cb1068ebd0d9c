//! Event tuples, §4.8/§6.4: a stable name plus an ordered list of ASCII
//! fields. Field order is normative and MUST NOT change across variants —
//! downstream consumers match positionally, not by name.

/// Sink the engine hands every emitted event to, in handler source-order
/// within an invocation. The host owns durability (§5: "the host is
/// responsible for durability").
pub trait EventSink: Send + Sync {
    fn emit(&self, name: &str, fields: &[String]);
}

/// An `EventSink` that drops everything, for handlers or tests that don't
/// care about the emitted log.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _name: &str, _fields: &[String]) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NodeStaked {
        node_id: String,
        caller: String,
        amount: u64,
        timestamp: u64,
    },
    WithdrawalRequested {
        caller: String,
        amount: u64,
        timestamp: u64,
    },
    NodeSlashed {
        address: String,
        penalty: u64,
        reason: String,
        timestamp: u64,
    },
    NodeChallenged {
        caller: String,
        cache_key: String,
        reason: String,
        timestamp: u64,
    },
    ReputationUpdated {
        address: String,
        delta: i64,
        new: i64,
        timestamp: u64,
    },
    ValidatorAdded {
        address: String,
        timestamp: u64,
    },
    ContractPaused {
        timestamp: u64,
    },
    ContractResumed {
        timestamp: u64,
    },
    ThreatReported {
        id: String,
        source_ip: String,
        target_ip: String,
        threat_type: String,
        timestamp: u64,
    },
    ThreatVerified {
        id: String,
        verifier: String,
        verdict: bool,
        timestamp: u64,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::NodeStaked { .. } => "NodeStaked",
            Event::WithdrawalRequested { .. } => "WithdrawalRequested",
            Event::NodeSlashed { .. } => "NodeSlashed",
            Event::NodeChallenged { .. } => "NodeChallenged",
            Event::ReputationUpdated { .. } => "ReputationUpdated",
            Event::ValidatorAdded { .. } => "ValidatorAdded",
            Event::ContractPaused { .. } => "ContractPaused",
            Event::ContractResumed { .. } => "ContractResumed",
            Event::ThreatReported { .. } => "ThreatReported",
            Event::ThreatVerified { .. } => "ThreatVerified",
        }
    }

    pub fn fields(&self) -> Vec<String> {
        match self {
            Event::NodeStaked {
                node_id,
                caller,
                amount,
                timestamp,
            } => vec![
                node_id.clone(),
                caller.clone(),
                amount.to_string(),
                timestamp.to_string(),
            ],
            Event::WithdrawalRequested {
                caller,
                amount,
                timestamp,
            } => vec![caller.clone(), amount.to_string(), timestamp.to_string()],
            Event::NodeSlashed {
                address,
                penalty,
                reason,
                timestamp,
            } => vec![
                address.clone(),
                penalty.to_string(),
                reason.clone(),
                timestamp.to_string(),
            ],
            Event::NodeChallenged {
                caller,
                cache_key,
                reason,
                timestamp,
            } => vec![
                caller.clone(),
                cache_key.clone(),
                reason.clone(),
                timestamp.to_string(),
            ],
            Event::ReputationUpdated {
                address,
                delta,
                new,
                timestamp,
            } => vec![
                address.clone(),
                delta.to_string(),
                new.to_string(),
                timestamp.to_string(),
            ],
            Event::ValidatorAdded { address, timestamp } => {
                vec![address.clone(), timestamp.to_string()]
            }
            Event::ContractPaused { timestamp } => vec![timestamp.to_string()],
            Event::ContractResumed { timestamp } => vec![timestamp.to_string()],
            Event::ThreatReported {
                id,
                source_ip,
                target_ip,
                threat_type,
                timestamp,
            } => vec![
                id.clone(),
                source_ip.clone(),
                target_ip.clone(),
                threat_type.clone(),
                timestamp.to_string(),
            ],
            Event::ThreatVerified {
                id,
                verifier,
                verdict,
                timestamp,
            } => vec![
                id.clone(),
                verifier.clone(),
                verdict.to_string(),
                timestamp.to_string(),
            ],
        }
    }

}

/// Flushes a completed invocation's buffered events to the sink, in the
/// order they were pushed. Only called after `Txn::commit` has succeeded
/// (§5: writes and emitted events are discarded together on abort), so the
/// event log and committed state can never diverge.
pub fn flush(events: Vec<Event>, sink: &dyn EventSink) {
    for event in events {
        let fields = event.fields();
        sink.emit(event.name(), &fields);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;
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

    #[test]
    fn node_staked_field_order_is_stable() {
        let sink = RecordingSink::default();
        flush(
            vec![Event::NodeStaked {
                node_id: "n1".into(),
                caller: "alice".into(),
                amount: 10_000,
                timestamp: 42,
            }],
            &sink,
        );
        let got = sink.0.lock().unwrap();
        assert_eq!(
            got[0],
            (
                "NodeStaked".to_string(),
                vec![
                    "n1".to_string(),
                    "alice".to_string(),
                    "10000".to_string(),
                    "42".to_string()
                ]
            )
        );
    }
}
