//! ES256 signature verification

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use p256::PublicKey;

/// Verify an ECDSA P-256 / SHA-256 signature in JWS form (`r || s`, 64
/// bytes) over `signing_input`.
///
/// Any malformed signature yields `false`.
pub fn verify_es256(signing_input: &[u8], signature: &[u8], key: &PublicKey) -> bool {
    let signature = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };
    VerifyingKey::from(key).verify(signing_input, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::generate_key_pair;
    use p256::ecdsa::signature::Signer;

    #[test]
    fn test_verify() {
        let (signing_key, key) = generate_key_pair();
        let sig: Signature = signing_key.sign(b"header.payload");

        assert!(verify_es256(b"header.payload", &sig.to_bytes(), &key));
        assert!(!verify_es256(b"header.payload2", &sig.to_bytes(), &key));

        let (_, other) = generate_key_pair();
        assert!(!verify_es256(b"header.payload", &sig.to_bytes(), &other));
    }

    #[test]
    fn test_malformed_signature() {
        let (signing_key, key) = generate_key_pair();
        let sig: Signature = signing_key.sign(b"data");
        let bytes = sig.to_bytes();

        assert!(!verify_es256(b"data", &[], &key));
        assert!(!verify_es256(b"data", &bytes[..57], &key));
        assert!(!verify_es256(b"data", &[0u8; 64], &key));

        let mut flipped = bytes.to_vec();
        flipped[10] ^= 0x01;
        assert!(!verify_es256(b"data", &flipped, &key));
    }
}
