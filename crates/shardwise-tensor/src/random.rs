//! Random State - Process-Wide Generator
//!
//! Random kernels (`bernoulli`, the dropout family, `rrelu`,
//! `gumbel_softmax`) all draw from one process-wide generator. It starts from
//! OS entropy and can be reseeded for reproducible runs.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::sync::OnceLock;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

static GENERATOR: OnceLock<Mutex<StdRng>> = OnceLock::new();

fn generator() -> &'static Mutex<StdRng> {
    GENERATOR.get_or_init(|| Mutex::new(StdRng::from_entropy()))
}

/// Reseeds the global generator.
pub fn manual_seed(seed: u64) {
    *generator().lock() = StdRng::seed_from_u64(seed);
}

/// Runs `f` with exclusive access to the global generator.
pub fn with_generator<R>(f: impl FnOnce(&mut StdRng) -> R) -> R {
    f(&mut generator().lock())
}

/// Draws `n` uniform samples from `[0, 1)`.
#[must_use]
pub fn uniform(n: usize) -> Vec<f64> {
    with_generator(|rng| (0..n).map(|_| rng.gen::<f64>()).collect())
}

// =============================================================================
// Tests
// =============================================================================
