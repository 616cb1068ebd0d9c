//! `--strict-sig` signature verifier: a single ed25519 public key loaded
//! from a hex-encoded keyfile, checked against `data_hash`/`sm2_signature`.
//! The default CLI mode doesn't use this (`AlwaysValidVerifier`); this is
//! the opt-in path for driving the engine against real signatures.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sentry_core::SignatureVerifier;
use std::path::Path;

fn decode_hex(s: &str) -> anyhow::Result<Vec<u8>> {
    let s = s.trim();
    if s.len() % 2 != 0 {
        anyhow::bail!("hex string has odd length");
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(anyhow::Error::from))
        .collect()
}

pub struct KeyfileVerifier {
    key: VerifyingKey,
}

impl KeyfileVerifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let bytes = decode_hex(&raw)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("keyfile must contain a 32-byte ed25519 public key"))?;
        let key = VerifyingKey::from_bytes(&bytes)?;
        Ok(KeyfileVerifier { key })
    }
}

impl SignatureVerifier for KeyfileVerifier {
    fn verify(&self, _caller: &str, data_hash: &str, signature: &str) -> bool {
        let Ok(sig_bytes) = decode_hex(signature) else {
            return false;
        };
        let Ok(sig_bytes): Result<[u8; 64], _> = sig_bytes.try_into() else {
            return false;
        };
        let sig = Signature::from_bytes(&sig_bytes);
        self.key.verify(data_hash.as_bytes(), &sig).is_ok()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn decode_hex_round_trip() {
        assert_eq!(decode_hex("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(decode_hex("xyz").is_err());
        assert!(decode_hex("abc").is_err());
    }
}
