//! Contiguous, order-preserving input partitioning.

/// Slice boundaries: worker `i` owns `[b[i], b[i + 1])` with
/// `b[i] = i * total / workers` (floor division).
pub fn boundaries(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return vec![0];
    }
    (0..=workers).map(|i| i * total / workers).collect()
}

/// Split `items` into `workers` contiguous slices whose sizes differ by at
/// most one.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    let bounds = boundaries(items.len(), workers);
    let mut iter = items.into_iter();
    bounds
        .windows(2)
        .map(|w| iter.by_ref().take(w[1] - w[0]).collect())
        .collect()
}
