//! Benchmark runner: times keygen, sign and verify per algorithm and keeps
//! every raw trial.

use std::path::PathBuf;
use std::time::Duration;

use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::harness::{measure_trials, micros, BenchConfig, MESSAGE};
use crate::schema::{EnvironmentInfo, TrialRecord};
use crate::schemes::{Ed25519, Secp256k1, SignatureScheme};
use crate::table::{self, DEFAULT_ENV_PATH, DEFAULT_RESULTS_PATH};
use crate::{env_info, Algorithm, BenchError, Operation, Result};

type SchemeRunner = fn(&BenchConfig, &mut ChaCha8Rng) -> Result<Vec<TrialRecord>>;

struct SchemeEntry {
    algorithm: Algorithm,
    run: SchemeRunner,
}

const SCHEMES: [SchemeEntry; 2] = [
    SchemeEntry {
        algorithm: Algorithm::Secp256k1,
        run: run_scheme::<Secp256k1>,
    },
    SchemeEntry {
        algorithm: Algorithm::Ed25519,
        run: run_scheme::<Ed25519>,
    },
];

fn scheme_runner(schemes: &[SchemeEntry], algorithm: Algorithm) -> Result<SchemeRunner> {
    schemes
        .iter()
        .find(|entry| entry.algorithm == algorithm)
        .map(|entry| entry.run)
        .ok_or_else(|| BenchError::Configuration(format!("no scheme registered for {algorithm}")))
}

#[derive(Clone, Debug)]
pub struct OutputPaths {
    pub results: PathBuf,
    pub env: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            results: PathBuf::from(DEFAULT_RESULTS_PATH),
            env: PathBuf::from(DEFAULT_ENV_PATH),
        }
    }
}

#[derive(Clone, Debug)]
pub struct BenchmarkRun {
    pub records: Vec<TrialRecord>,
    pub environment: EnvironmentInfo,
}

fn push_trials(
    out: &mut Vec<TrialRecord>,
    algorithm: Algorithm,
    operation: Operation,
    samples: Vec<Duration>,
) {
    if !samples.is_empty() {
        let mean = samples.iter().map(|d| micros(*d)).sum::<f64>() / samples.len() as f64;
        debug!(%algorithm, %operation, trials = samples.len(), mean_us = mean, "measured");
    }
    out.extend(samples.into_iter().map(|d| TrialRecord {
        algorithm,
        operation,
        elapsed_time: micros(d),
    }));
}

/// Keygen, sign and verify trials for one scheme.
///
/// The signing key pair and the signature used by the verify trials are made
/// before their timed loops; only the single library call is inside a trial.
fn run_scheme<S: SignatureScheme>(
    cfg: &BenchConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<TrialRecord>> {
    let algorithm = S::ALGORITHM;
    let iters = cfg.trial_count;
    let warmup = cfg.warmup_count;
    let mut out = Vec::with_capacity(3 * iters as usize);

    let samples = measure_trials(iters, warmup, || Ok(S::generate_keypair(rng)), |_| Ok(()))?;
    push_trials(&mut out, algorithm, Operation::Keygen, samples);

    let (sk, vk) = S::generate_keypair(rng);
    let samples = measure_trials(iters, warmup, || S::sign(&sk, MESSAGE), |_| Ok(()))?;
    push_trials(&mut out, algorithm, Operation::Sign, samples);

    let signature = S::sign(&sk, MESSAGE)?;
    let samples = measure_trials(
        iters,
        warmup,
        || Ok(S::verify(&vk, MESSAGE, &signature)),
        |valid| {
            if valid {
                Ok(())
            } else {
                Err(BenchError::crypto(
                    algorithm,
                    Operation::Verify,
                    "signature rejected by its own verifying key",
                ))
            }
        },
    )?;
    push_trials(&mut out, algorithm, Operation::Verify, samples);

    Ok(out)
}

/// Measure every configured algorithm and capture the host description.
/// Nothing is written to disk.
pub fn run(cfg: &BenchConfig) -> Result<BenchmarkRun> {
    run_with(cfg, &SCHEMES)
}

fn run_with(cfg: &BenchConfig, schemes: &[SchemeEntry]) -> Result<BenchmarkRun> {
    cfg.validate()?;

    let environment = env_info::capture();
    let mut records = Vec::with_capacity(cfg.expected_rows() as usize);

    for &algorithm in &cfg.algorithms {
        let runner = scheme_runner(schemes, algorithm)?;
        info!(
            %algorithm,
            trials = cfg.trial_count,
            warmup = cfg.warmup_count,
            "benchmarking"
        );
        let mut rng = cfg.rng_for(algorithm);
        records.extend(runner(cfg, &mut rng)?);
    }

    debug_assert_eq!(records.len() as u64, cfg.expected_rows());
    Ok(BenchmarkRun {
        records,
        environment,
    })
}

/// Run the benchmark and replace both tables only if every trial succeeded.
pub fn run_and_persist(cfg: &BenchConfig, paths: &OutputPaths) -> Result<BenchmarkRun> {
    persist_with(cfg, paths, &SCHEMES)
}

fn persist_with(
    cfg: &BenchConfig,
    paths: &OutputPaths,
    schemes: &[SchemeEntry],
) -> Result<BenchmarkRun> {
    let run = run_with(cfg, schemes)?;
    table::write_tables(&run.records, &paths.results, &run.environment, &paths.env)?;
    info!(
        rows = run.records.len(),
        results = %paths.results.display(),
        env = %paths.env.display(),
        "benchmark tables written"
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn quick(trials: u64) -> BenchConfig {
        BenchConfig {
            trial_count: trials,
            warmup_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn five_trials_give_thirty_rows() {
        let run = run(&quick(5)).unwrap();
        assert_eq!(run.records.len(), 30);

        let mut per_group: HashMap<(Algorithm, Operation), usize> = HashMap::new();
        for r in &run.records {
            assert!(r.elapsed_time >= 0.0);
            *per_group.entry((r.algorithm, r.operation)).or_default() += 1;
        }
        assert_eq!(per_group.len(), 6);
        assert!(per_group.values().all(|&n| n == 5));
    }

    #[test]
    fn rows_follow_configured_order() {
        let cfg = BenchConfig {
            algorithms: vec![Algorithm::Ed25519, Algorithm::Secp256k1],
            ..quick(2)
        };
        let run = run(&cfg).unwrap();
        let order: Vec<(Algorithm, Operation)> = run
            .records
            .iter()
            .map(|r| (r.algorithm, r.operation))
            .collect();
        assert_eq!(order[0], (Algorithm::Ed25519, Operation::Keygen));
        assert_eq!(order[2], (Algorithm::Ed25519, Operation::Sign));
        assert_eq!(order[4], (Algorithm::Ed25519, Operation::Verify));
        assert_eq!(order[6], (Algorithm::Secp256k1, Operation::Keygen));
        assert_eq!(order[11], (Algorithm::Secp256k1, Operation::Verify));
    }

    #[test]
    fn single_algorithm_selection() {
        let cfg = BenchConfig {
            algorithms: vec![Algorithm::Secp256k1],
            ..quick(3)
        };
        let run = run(&cfg).unwrap();
        assert_eq!(run.records.len(), 9);
        assert!(run
            .records
            .iter()
            .all(|r| r.algorithm == Algorithm::Secp256k1));
    }

    #[test]
    fn every_algorithm_is_registered() {
        for alg in Algorithm::ALL {
            assert!(scheme_runner(&SCHEMES, alg).is_ok());
        }
    }

    #[test]
    fn invalid_config_writes_nothing() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths {
            results: dir.path().join("results.csv"),
            env: dir.path().join("env.csv"),
        };
        let err = run_and_persist(&quick(0), &paths).unwrap_err();
        assert!(matches!(err, BenchError::Configuration(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    /// Ed25519 keys whose verification always fails.
    struct RejectingScheme;

    impl SignatureScheme for RejectingScheme {
        const ALGORITHM: Algorithm = Algorithm::Ed25519;
        type SigningKey = <Ed25519 as SignatureScheme>::SigningKey;
        type VerifyingKey = <Ed25519 as SignatureScheme>::VerifyingKey;
        type Signature = <Ed25519 as SignatureScheme>::Signature;

        fn generate_keypair(rng: &mut ChaCha8Rng) -> (Self::SigningKey, Self::VerifyingKey) {
            Ed25519::generate_keypair(rng)
        }

        fn sign(sk: &Self::SigningKey, msg: &[u8]) -> Result<Self::Signature> {
            Ed25519::sign(sk, msg)
        }

        fn verify(_: &Self::VerifyingKey, _: &[u8], _: &Self::Signature) -> bool {
            false
        }
    }

    #[test]
    fn rejected_signature_aborts_without_writing() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths {
            results: dir.path().join("results.csv"),
            env: dir.path().join("env.csv"),
        };
        let schemes = [
            SchemeEntry {
                algorithm: Algorithm::Secp256k1,
                run: run_scheme::<Secp256k1>,
            },
            SchemeEntry {
                algorithm: Algorithm::Ed25519,
                run: run_scheme::<RejectingScheme>,
            },
        ];
        let err = persist_with(&quick(3), &paths, &schemes).unwrap_err();
        match err {
            BenchError::CryptoOperation {
                algorithm,
                operation,
                ..
            } => {
                assert_eq!(algorithm, Algorithm::Ed25519);
                assert_eq!(operation, Operation::Verify);
            }
            other => panic!("expected crypto error, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn persisted_tables_match_run() {
        let dir = tempdir().unwrap();
        let paths = OutputPaths {
            results: dir.path().join("results.csv"),
            env: dir.path().join("env.csv"),
        };
        let run = run_and_persist(&quick(4), &paths).unwrap();
        let loaded = table::read_results(&paths.results).unwrap();
        assert_eq!(loaded.len(), 24);
        assert_eq!(loaded, run.records);
        assert_eq!(table::read_environment(&paths.env).unwrap(), run.environment);
    }
}
