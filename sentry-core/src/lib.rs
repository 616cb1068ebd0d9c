//! The membership-and-attestation engine: capability gate, nonce register,
//! node registry, staking lifecycle, reputation engine, threat attestation
//! store, governance controls, dispatcher, and lifecycle entry points.

pub mod capability;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod event;
pub mod governance;
pub mod node;
pub mod nonce;
pub mod query;
pub mod reputation;
pub mod staking;
pub mod threat;

pub use config::EngineConfig;
pub use context::{AlwaysValidVerifier, SignatureVerifier};
pub use dispatch::{ArgMap, InvokeOutcome};
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use event::{Event, EventSink, NullEventSink};
pub use governance::ContractState;
pub use node::{DeploymentType, Node, NodeStatus, Tier};
pub use threat::{GlobalThreatEntry, ThreatAttestation, ThreatLevel};
