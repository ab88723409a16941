use std::hint::black_box;
use std::time::{Duration, Instant};

use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::{Algorithm, BenchError, Result};

pub const DEFAULT_TRIAL_COUNT: u64 = 1_000;
pub const DEFAULT_WARMUP_COUNT: u64 = 10;
/// Upper bound on trials per (algorithm, operation); all rows are buffered in memory.
pub const MAX_TRIAL_COUNT: u64 = 1_000_000;

/// Message signed and verified by every trial of every algorithm.
pub const MESSAGE: &[u8] = b"benchmark test message";

#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub trial_count: u64,
    pub warmup_count: u64,
    pub seed: u64,
    pub algorithms: Vec<Algorithm>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            warmup_count: DEFAULT_WARMUP_COUNT,
            seed: 0,
            algorithms: Algorithm::ALL.to_vec(),
        }
    }
}

impl BenchConfig {
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.seed)
    }

    /// Key-material stream for one algorithm, independent of which other
    /// algorithms are selected or their order.
    pub fn rng_for(&self, algorithm: Algorithm) -> ChaCha8Rng {
        let mut rng = self.rng();
        rng.set_stream(algorithm as u64);
        rng
    }

    pub fn validate(&self) -> Result<()> {
        if self.trial_count == 0 || self.trial_count > MAX_TRIAL_COUNT {
            return Err(BenchError::Configuration(format!(
                "trial_count must be in 1..={MAX_TRIAL_COUNT}, got {}",
                self.trial_count
            )));
        }
        if self.warmup_count > MAX_TRIAL_COUNT {
            return Err(BenchError::Configuration(format!(
                "warmup_count must be at most {MAX_TRIAL_COUNT}, got {}",
                self.warmup_count
            )));
        }
        if self.algorithms.is_empty() {
            return Err(BenchError::Configuration(
                "algorithms must name at least one of secp256k1, ed25519".to_string(),
            ));
        }
        for (i, alg) in self.algorithms.iter().enumerate() {
            if self.algorithms[..i].contains(alg) {
                return Err(BenchError::Configuration(format!(
                    "algorithms lists {alg} more than once"
                )));
            }
        }
        Ok(())
    }

    /// Rows a successful run produces.
    pub fn expected_rows(&self) -> u64 {
        self.algorithms.len() as u64 * 3 * self.trial_count
    }
}

/// Time exactly one call of `f`.
pub fn time_call<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = black_box(f());
    let elapsed = start.elapsed();
    (out, elapsed)
}

/// Run `warmup_iters` untimed calls, then `iters` individually timed calls.
///
/// `check` sees each timed call's output outside the timed region and may
/// abort the whole measurement.
pub fn measure_trials<T>(
    iters: u64,
    warmup_iters: u64,
    mut f: impl FnMut() -> Result<T>,
    mut check: impl FnMut(T) -> Result<()>,
) -> Result<Vec<Duration>> {
    for _ in 0..warmup_iters {
        black_box(f()?);
    }

    let mut samples = Vec::with_capacity(iters as usize);
    for _ in 0..iters {
        let (out, elapsed) = time_call(&mut f);
        check(out?)?;
        samples.push(elapsed);
    }
    Ok(samples)
}

pub fn micros(d: Duration) -> f64 {
    d.as_nanos() as f64 / 1_000.0
}
