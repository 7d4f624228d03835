use super::*;

#[test]
fn test_one_hot_layout() {
    let t = SparseTensor::from_one_hot(&[3, 0, 9], 10, StorageDevice::Host).unwrap();
    assert_eq!(t.shape(), vec![3, 10]);
    assert_eq!(t.nnz(), 3);
    assert_eq!(t.row_offsets().unwrap(), &[0, 1, 2, 3]);
    assert_eq!(t.col_indices().unwrap(), &[3, 0, 9]);
    assert_eq!(t.values().unwrap(), &[1.0, 1.0, 1.0]);
}

#[test]
fn test_one_hot_rejects_out_of_range_label() {
    let result = SparseTensor::from_one_hot(&[10], 10, StorageDevice::Host);
    assert!(matches!(result, Err(GnnError::InvalidSparse(_))));
}

#[test]
fn test_manual_population() {
    let mut t = SparseTensor::new(StorageDevice::Host);
    t.reshape(2, 4);
    t.resize_nnz(3);
    t.row_offsets_mut().unwrap().copy_from_slice(&[0, 2, 3]);
    t.col_indices_mut().unwrap().copy_from_slice(&[3, 1, 0]);
    t.values_mut().unwrap().copy_from_slice(&[0.5, 0.25, 2.0]);
    t.validate().unwrap();

    let dense = t.to_dense().unwrap();
    assert_eq!(
        dense.host_data().unwrap(),
        &[0.0, 0.25, 0.0, 0.5, 2.0, 0.0, 0.0, 0.0]
    );
}

#[test]
fn test_validate_rejects_broken_invariants() {
    let decreasing = SparseTensor::from_csr(2, 3, vec![0, 2, 1], vec![0], vec![1.0], StorageDevice::Host);
    assert!(matches!(decreasing, Err(GnnError::InvalidSparse(_))));

    let wrong_last = SparseTensor::from_csr(1, 3, vec![0, 2], vec![0], vec![1.0], StorageDevice::Host);
    assert!(matches!(wrong_last, Err(GnnError::InvalidSparse(_))));

    let bad_col = SparseTensor::from_csr(1, 3, vec![0, 1], vec![3], vec![1.0], StorageDevice::Host);
    assert!(matches!(bad_col, Err(GnnError::InvalidSparse(_))));

    let bad_len = SparseTensor::from_csr(2, 3, vec![0, 1], vec![0], vec![1.0], StorageDevice::Host);
    assert!(matches!(bad_len, Err(GnnError::InvalidSparse(_))));
}

#[test]
fn test_empty_rows_are_valid() {
    let t = SparseTensor::from_csr(3, 2, vec![0, 0, 1, 1], vec![1], vec![1.0], StorageDevice::Host).unwrap();
    let csr = t.csr();
    assert_eq!(csr.row(0).count(), 0);
    assert_eq!(csr.row(1).collect::<Vec<_>>(), vec![(1, 1.0)]);
    assert_eq!(csr.row(2).count(), 0);
}

#[test]
fn test_copy_across_devices() {
    let host = SparseTensor::from_one_hot(&[1, 2], 3, StorageDevice::Host).unwrap();
    let mut acc = SparseTensor::new(StorageDevice::Accelerator);
    acc.copy_from(&host);
    assert_eq!(acc.shape(), vec![2, 3]);
    assert!(matches!(acc.values(), Err(GnnError::DeviceMismatch { .. })));
    acc.validate().unwrap();

    let mut back = SparseTensor::new(StorageDevice::Host);
    back.copy_from(&acc);
    assert_eq!(back, host);
}
