use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand_chacha::ChaCha8Rng;

use super::SignatureScheme;
use crate::{Algorithm, BenchError, Operation, Result};

/// ECDSA over secp256k1 with SHA-256 message digests (RFC 6979 nonces).
pub struct Secp256k1;

impl SignatureScheme for Secp256k1 {
    const ALGORITHM: Algorithm = Algorithm::Secp256k1;

    type SigningKey = SigningKey;
    type VerifyingKey = VerifyingKey;
    type Signature = Signature;

    fn generate_keypair(rng: &mut ChaCha8Rng) -> (SigningKey, VerifyingKey) {
        let sk = SigningKey::random(rng);
        let vk = VerifyingKey::from(&sk);
        (sk, vk)
    }

    fn sign(key: &SigningKey, message: &[u8]) -> Result<Signature> {
        let sig: Signature = key
            .try_sign(message)
            .map_err(|e| BenchError::crypto(Self::ALGORITHM, Operation::Sign, e))?;
        Ok(sig)
    }

    fn verify(key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
        key.verify(message, signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::rand_core::SeedableRng;

    #[test]
    fn same_seed_same_key() {
        let (a, _) = Secp256k1::generate_keypair(&mut ChaCha8Rng::seed_from_u64(7));
        let (b, _) = Secp256k1::generate_keypair(&mut ChaCha8Rng::seed_from_u64(7));
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn signing_is_deterministic() {
        let (sk, _) = Secp256k1::generate_keypair(&mut ChaCha8Rng::seed_from_u64(1));
        let s1 = Secp256k1::sign(&sk, b"msg").unwrap();
        let s2 = Secp256k1::sign(&sk, b"msg").unwrap();
        assert_eq!(s1, s2);
    }
}
