use super::*;
use crate::datasets::InMemoryDataset;
use crate::samplers::{RandomSampler, SequentialSampler};

/// Five samples of two features `[i, 10 i]` labelled `i % 3`.
fn dataset() -> InMemoryDataset {
    let features = (0..5).flat_map(|i| [i as f32, 10.0 * i as f32]).collect();
    let labels = (0..5).map(|i| i % 3).collect();
    InMemoryDataset::new(features, labels, 2, 3).unwrap()
}

fn config(batch_size: usize, drop_last: bool) -> LoaderConfig {
    LoaderConfig { batch_size, drop_last }
}

#[derive(Debug)]
struct OutOfRange;

impl Sampler for OutOfRange {
    fn iter(&self, _dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        Box::new(vec![0, 7].into_iter())
    }
}

#[test]
fn test_batches_in_sampler_order() {
    let data = dataset();
    let mut loader = BatchLoader::new(&data, SequentialSampler::new(), config(2, false)).unwrap();
    assert_eq!(loader.num_batches(), 3);

    let (x, y) = loader.next_batch().unwrap().unwrap();
    assert_eq!(x.shape(), &[2, 2]);
    assert_eq!(x.to_vec(), vec![0.0, 0.0, 1.0, 10.0]);
    assert_eq!(y.shape(), vec![2, 3]);
    assert!(y.validate().is_ok());
    assert_eq!(y.to_dense().unwrap().to_vec(), vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);

    let (x, y) = loader.next_batch().unwrap().unwrap();
    assert_eq!(x.to_vec(), vec![2.0, 20.0, 3.0, 30.0]);
    assert_eq!(y.col_indices().unwrap(), &[2, 0]);

    let (x, y) = loader.next_batch().unwrap().unwrap();
    assert_eq!(x.shape(), &[1, 2]);
    assert_eq!(x.to_vec(), vec![4.0, 40.0]);
    assert_eq!(y.rows(), 1);
    assert_eq!(y.nnz(), 1);
    assert_eq!(y.row_offsets().unwrap(), &[0, 1]);
    assert!(y.validate().is_ok());

    assert!(loader.next_batch().unwrap().is_none());
    assert!(loader.next_batch().unwrap().is_none());
}

#[test]
fn test_drop_last_skips_short_batch() {
    let data = dataset();
    let mut loader = BatchLoader::new(&data, SequentialSampler::new(), config(2, true)).unwrap();
    assert_eq!(loader.num_batches(), 2);
    let mut seen = 0;
    while let Some((x, _)) = loader.next_batch().unwrap() {
        assert_eq!(x.rows(), 2);
        seen += 1;
    }
    assert_eq!(seen, 2);
}

#[test]
fn test_start_epoch_rewinds() {
    let data = dataset();
    let mut loader = BatchLoader::new(&data, SequentialSampler::new(), config(5, false)).unwrap();
    let first = loader.next_batch().unwrap().unwrap().0.to_vec();
    assert!(loader.next_batch().unwrap().is_none());

    loader.start_epoch();
    let again = loader.next_batch().unwrap().unwrap().0.to_vec();
    assert_eq!(first, again);
}

#[test]
fn test_random_epoch_covers_every_sample() {
    let data = dataset();
    let mut loader = BatchLoader::new(&data, RandomSampler::with_seed(3), config(2, false)).unwrap();
    for _ in 0..2 {
        let mut firsts = Vec::new();
        while let Some((x, y)) = loader.next_batch().unwrap() {
            let values = x.to_vec();
            let labels = y.col_indices().unwrap();
            for (row, &label) in values.chunks(2).zip(labels) {
                assert_eq!(row[1], 10.0 * row[0]);
                assert_eq!(label, row[0] as usize % 3);
                firsts.push(row[0] as usize);
            }
        }
        firsts.sort_unstable();
        assert_eq!(firsts, vec![0, 1, 2, 3, 4]);
        loader.start_epoch();
    }
}

#[test]
fn test_invalid_config_and_indices() {
    let data = dataset();
    assert!(matches!(
        BatchLoader::new(&data, SequentialSampler::new(), config(0, false)),
        Err(DataError::ConfigurationError(_))
    ));
    assert_eq!(LoaderConfig::default(), config(100, false));

    let mut loader = BatchLoader::new(&data, OutOfRange, config(2, false)).unwrap();
    assert!(matches!(
        loader.next_batch(),
        Err(DataError::IndexOutOfBounds { index: 7, len: 5 })
    ));
}

#[test]
fn test_empty_dataset_yields_nothing() {
    let data = InMemoryDataset::new(Vec::new(), Vec::new(), 4, 2).unwrap();
    let mut loader = BatchLoader::new(&data, SequentialSampler::new(), LoaderConfig::default()).unwrap();
    assert_eq!(loader.num_batches(), 0);
    assert!(loader.next_batch().unwrap().is_none());
}
