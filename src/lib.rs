use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod env_info;
pub mod error;
pub mod harness;
pub mod report;
pub mod runner;
pub mod schema;
pub mod schemes;
pub mod table;

pub use error::{BenchError, Result};

/// Signature algorithm to benchmark.
#[derive(
    Clone, Copy, Debug, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// ECDSA over secp256k1 (k256).
    Secp256k1,
    /// EdDSA over Curve25519 (ed25519-dalek).
    Ed25519,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Secp256k1, Algorithm::Ed25519];

    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Secp256k1 => "secp256k1",
            Algorithm::Ed25519 => "ed25519",
        }
    }

    /// Name used in chart legends and console tables.
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::Secp256k1 => "secp256k1",
            Algorithm::Ed25519 => "Ed25519",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three timed operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Keygen,
    Sign,
    Verify,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Keygen, Operation::Sign, Operation::Verify];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Keygen => "keygen",
            Operation::Sign => "sign",
            Operation::Verify => "verify",
        }
    }

    /// Category label on the chart's horizontal axis.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Keygen => "Key Generation",
            Operation::Sign => "Signing",
            Operation::Verify => "Verification",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
