use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the per-job marker strings.
///
/// Tokens are drawn from `[A-Za-z0-9]` and are not meant to be secret. A
/// seeded generator makes repeated runs produce identical job graphs.
pub struct TokenGenerator {
    rng: StdRng,
    len: usize,
}

impl TokenGenerator {
    /// Creates a generator with a fixed seed.
    pub fn seeded(seed: u64, len: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            len,
        }
    }

    /// Creates a generator seeded from OS entropy.
    pub fn from_entropy(len: usize) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            len,
        }
    }

    /// Builds a generator from an optional seed, falling back to entropy.
    pub fn new(seed: Option<u64>, len: usize) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed, len),
            None => Self::from_entropy(len),
        }
    }

    pub fn next_token(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(self.len)
            .map(char::from)
            .collect()
    }
}
