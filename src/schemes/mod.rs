//! Signature schemes under test.
//!
//! Each scheme exposes the same three calls so the runner's measurement loop
//! stays generic; nothing outside this module names a concrete curve library.

use rand_chacha::ChaCha8Rng;

use crate::{Algorithm, Result};

pub mod ed25519;
pub mod secp256k1;

pub use ed25519::Ed25519;
pub use secp256k1::Secp256k1;

pub trait SignatureScheme {
    const ALGORITHM: Algorithm;

    type SigningKey;
    type VerifyingKey;
    type Signature;

    /// Generate a fresh key pair, including derivation of the public half.
    fn generate_keypair(rng: &mut ChaCha8Rng) -> (Self::SigningKey, Self::VerifyingKey);

    fn sign(key: &Self::SigningKey, message: &[u8]) -> Result<Self::Signature>;

    fn verify(key: &Self::VerifyingKey, message: &[u8], signature: &Self::Signature) -> bool;
}
