//! Typed error enum matching the message patterns of §7's error taxonomy.
//!
//! Every variant is logged once at construction (`tracing::warn!`, except the
//! routine `NotFound` read-path which logs at `debug`), mirroring the
//! log-at-the-boundary discipline in `sentry_base::Error::new`.

use crate::governance::ContractState;
use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    ArgumentMissing { name: String },
    ArgumentMalformed { name: String, detail: String },
    StateNotActive { state: ContractState },
    CapabilityDenied { role: String, caller: String },
    Replay,
    Duplicate { detail: String },
    NotFound { detail: String },
    PolicyViolation { detail: String },
    SignatureInvalid,
    UnknownMethod,
    StoreError { op: String, underlying: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ArgumentMissing { name } => write!(f, "{name} is required"),
            EngineError::ArgumentMalformed { name, detail } => {
                write!(f, "invalid {name}: {detail}")
            }
            EngineError::StateNotActive { state } => {
                write!(f, "contract is not active, current state: {}", state.ordinal())
            }
            EngineError::CapabilityDenied { role, caller } => {
                write!(f, "only {role} can call this function, caller: {caller}")
            }
            EngineError::Replay => write!(f, "nonce already used"),
            EngineError::Duplicate { detail } => write!(f, "{detail}"),
            EngineError::NotFound { detail } => write!(f, "{detail}"),
            EngineError::PolicyViolation { detail } => write!(f, "{detail}"),
            EngineError::SignatureInvalid => write!(f, "invalid signature"),
            EngineError::UnknownMethod => write!(f, "unknown method"),
            EngineError::StoreError { op, underlying } => {
                write!(f, "failed to {op}: {underlying}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        let err = EngineError::StoreError {
            op: "serialize payload".to_string(),
            underlying: e.to_string(),
        };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }
}

impl From<sentry_base::Error> for EngineError {
    fn from(e: sentry_base::Error) -> Self {
        let err = EngineError::StoreError {
            op: "access store".to_string(),
            underlying: e.to_string(),
        };
        tracing::warn!(target: "sentry_core", error = %err, "store error");
        err
    }
}

impl EngineError {
    pub fn argument_missing(name: impl Into<String>) -> Self {
        let err = EngineError::ArgumentMissing { name: name.into() };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn argument_malformed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        let err = EngineError::ArgumentMalformed {
            name: name.into(),
            detail: detail.into(),
        };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn state_not_active(state: ContractState) -> Self {
        let err = EngineError::StateNotActive { state };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn capability_denied(role: impl Into<String>, caller: impl Into<String>) -> Self {
        let err = EngineError::CapabilityDenied {
            role: role.into(),
            caller: caller.into(),
        };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn replay() -> Self {
        tracing::warn!(target: "sentry_core", "nonce already used");
        EngineError::Replay
    }

    pub fn duplicate(detail: impl Into<String>) -> Self {
        let err = EngineError::Duplicate {
            detail: detail.into(),
        };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        let err = EngineError::NotFound {
            detail: detail.into(),
        };
        tracing::debug!(target: "sentry_core", error = %err);
        err
    }

    pub fn policy_violation(detail: impl Into<String>) -> Self {
        let err = EngineError::PolicyViolation {
            detail: detail.into(),
        };
        tracing::warn!(target: "sentry_core", error = %err);
        err
    }

    pub fn signature_invalid() -> Self {
        tracing::warn!(target: "sentry_core", "invalid signature");
        EngineError::SignatureInvalid
    }

    pub fn unknown_method() -> Self {
        tracing::warn!(target: "sentry_core", "unknown method");
        EngineError::UnknownMethod
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn messages_match_taxonomy() {
        assert_eq!(
            EngineError::argument_missing("nonce").to_string(),
            "nonce is required"
        );
        assert_eq!(
            EngineError::argument_malformed("amount", "not a number").to_string(),
            "invalid amount: not a number"
        );
        assert_eq!(
            EngineError::state_not_active(ContractState::Paused).to_string(),
            "contract is not active, current state: 1"
        );
        assert_eq!(
            EngineError::capability_denied("owner", "alice").to_string(),
            "only owner can call this function, caller: alice"
        );
        assert_eq!(EngineError::replay().to_string(), "nonce already used");
        assert_eq!(
            EngineError::signature_invalid().to_string(),
            "invalid signature"
        );
    }
}
