use super::*;
use std::collections::HashSet;

#[test]
fn test_random_sampler_is_a_permutation() {
    let sampler = RandomSampler::new();
    assert_eq!(sampler.len(10), 10);
    let indices: Vec<usize> = sampler.iter(10).collect();
    assert_eq!(indices.len(), 10);
    let unique: HashSet<usize> = indices.into_iter().collect();
    assert_eq!(unique, (0..10).collect());
}

#[test]
fn test_random_sampler_empty() {
    assert_eq!(RandomSampler::new().iter(0).count(), 0);
}

#[test]
fn test_seeded_sampler_is_reproducible() {
    let a = RandomSampler::with_seed(42);
    let b = RandomSampler::with_seed(42);
    let first_a: Vec<usize> = a.iter(50).collect();
    let first_b: Vec<usize> = b.iter(50).collect();
    assert_eq!(first_a, first_b);

    // The next epoch is shuffled differently.
    let second_a: Vec<usize> = a.iter(50).collect();
    assert_ne!(first_a, second_a);
    assert_eq!(second_a, b.iter(50).collect::<Vec<_>>());
}
