use std::sync::atomic::{AtomicU64, Ordering};

use super::traits::Sampler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Visits every sample once per epoch in a freshly shuffled order.
///
/// A seeded sampler is reproducible: its `n`-th epoch is shuffled with a
/// generator seeded from `seed + n`.
#[derive(Debug, Default)]
pub struct RandomSampler {
    seed: Option<u64>,
    epoch: AtomicU64,
}

impl RandomSampler {
    /// A sampler shuffling with the thread-local generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reproducible sampler.
    pub fn with_seed(seed: u64) -> Self {
        RandomSampler {
            seed: Some(seed),
            epoch: AtomicU64::new(0),
        }
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        let mut indices: Vec<usize> = (0..dataset_len).collect();
        match self.seed {
            Some(seed) => {
                let epoch = self.epoch.fetch_add(1, Ordering::Relaxed);
                indices.shuffle(&mut StdRng::seed_from_u64(seed.wrapping_add(epoch)));
            }
            None => indices.shuffle(&mut rand::thread_rng()),
        }
        Box::new(indices.into_iter())
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
