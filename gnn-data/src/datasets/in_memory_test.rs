use super::*;

fn tiny() -> InMemoryDataset {
    InMemoryDataset::new(vec![0.0, 0.1, 1.0, 1.1, 2.0, 2.1], vec![2, 0, 1], 2, 3).unwrap()
}

#[test]
fn test_in_memory_accessors() {
    let dataset = tiny();
    assert_eq!(dataset.len(), 3);
    assert!(!dataset.is_empty());
    assert_eq!(dataset.feature_dim(), 2);
    assert_eq!(dataset.classes(), 3);
    assert_eq!(dataset.features(1).unwrap(), &[1.0, 1.1]);
    assert_eq!(dataset.label(0).unwrap(), 2);
    assert_eq!(dataset.labels(), &[2, 0, 1]);
}

#[test]
fn test_in_memory_out_of_bounds() {
    let dataset = tiny();
    assert!(matches!(
        dataset.features(3),
        Err(DataError::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(dataset.label(7), Err(DataError::IndexOutOfBounds { .. })));
}

#[test]
fn test_in_memory_rejects_bad_input() {
    assert!(matches!(
        InMemoryDataset::new(vec![0.0; 5], vec![0, 1], 2, 2),
        Err(DataError::Format(_))
    ));
    assert!(matches!(
        InMemoryDataset::new(vec![0.0; 4], vec![0, 2], 2, 2),
        Err(DataError::Format(_))
    ));
}

#[test]
fn test_empty_dataset() {
    let dataset = InMemoryDataset::new(Vec::new(), Vec::new(), 784, 10).unwrap();
    assert!(dataset.is_empty());
}
