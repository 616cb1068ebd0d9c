//! The signature-verification collaborator (§1: "out of scope... the core
//! asks 'is this signature valid over this digest for this principal?' and
//! trusts the answer").

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, caller: &str, data_hash: &str, signature: &str) -> bool;
}

/// Accepts every signature. Useful for the CLI's default mode and for tests
/// that don't exercise signature rejection.
pub struct AlwaysValidVerifier;

impl SignatureVerifier for AlwaysValidVerifier {
    fn verify(&self, _caller: &str, _data_hash: &str, _signature: &str) -> bool {
        true
    }
}
