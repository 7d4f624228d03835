/// Number of elements described by `shape` (1 for the empty shape).
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Splits a shape into (leading dimension, product of the rest).
///
/// Example: `[4, 3, 2]` -> `(4, 6)`, `[5]` -> `(5, 1)`, `[]` -> `(1, 1)`.
pub fn split_rows_cols(shape: &[usize]) -> (usize, usize) {
    match shape.split_first() {
        Some((&rows, rest)) => (rows, numel(rest)),
        None => (1, 1),
    }
}
