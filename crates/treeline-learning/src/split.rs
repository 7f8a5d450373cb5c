//! Random train/test partitioning.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, TrainingError};

/// Row indices of the two partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_rows` and hold out `ceil(n_rows * test_size)` rows for testing.
///
/// A seed makes the partition reproducible; without one the generator is
/// seeded from the operating system. Both partitions must end up non-empty.
pub(crate) fn train_test_split(
    n_rows: usize,
    test_size: f64,
    seed: Option<u64>,
) -> Result<TrainTestSplit> {
    let n_test = (n_rows as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(TrainingError::InvalidData(format!(
            "cannot split {} rows with test_size {}: both partitions need at least one row",
            n_rows, test_size
        )));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);

    Ok(TrainTestSplit {
        train,
        test: indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sizes_round_test_partition_up() {
        let split = train_test_split(10, 0.2, Some(1)).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);

        let split = train_test_split(11, 0.2, Some(1)).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_partitions_cover_every_row_once() {
        let split = train_test_split(25, 0.3, None).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = train_test_split(50, 0.2, Some(42)).unwrap();
        let b = train_test_split(50, 0.2, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_few_rows() {
        assert!(train_test_split(1, 0.2, Some(0)).is_err());
        assert!(train_test_split(0, 0.2, Some(0)).is_err());
        // 2 rows at 0.5 leaves one row on each side
        let split = train_test_split(2, 0.5, Some(0)).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (1, 1));
    }

    #[test]
    fn test_large_test_size_leaves_no_training_rows() {
        let err = train_test_split(3, 0.9, Some(0)).unwrap_err();
        assert!(err.to_string().contains("at least one row"));
    }
}
