use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_chacha::ChaCha8Rng;

use super::SignatureScheme;
use crate::{Algorithm, BenchError, Operation, Result};

/// EdDSA over edwards25519 (RFC 8032, pure Ed25519).
pub struct Ed25519;

impl SignatureScheme for Ed25519 {
    const ALGORITHM: Algorithm = Algorithm::Ed25519;

    type SigningKey = SigningKey;
    type VerifyingKey = VerifyingKey;
    type Signature = Signature;

    fn generate_keypair(rng: &mut ChaCha8Rng) -> (SigningKey, VerifyingKey) {
        let sk = SigningKey::generate(rng);
        let vk = sk.verifying_key();
        (sk, vk)
    }

    fn sign(key: &SigningKey, message: &[u8]) -> Result<Signature> {
        key.try_sign(message)
            .map_err(|e| BenchError::crypto(Self::ALGORITHM, Operation::Sign, e))
    }

    fn verify(key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
        key.verify(message, signature).is_ok()
    }
}
