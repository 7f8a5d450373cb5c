//! Evaluation metrics and importance normalisation.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::ConfusionMatrix;

/// Root mean squared error; `0.0` for empty input.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    (sum / actual.len() as f64).sqrt()
}

/// Fraction of equal pairs; `0.0` for empty input.
pub fn accuracy(actual: &[usize], predicted: &[usize]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    hits as f64 / actual.len() as f64
}

/// Confusion matrix over the sorted union of actual and predicted classes.
///
/// Class indices are rendered through `class_mapping`; an index missing from
/// the mapping is rendered as the number itself.
pub fn confusion_matrix(
    actual: &[usize],
    predicted: &[usize],
    class_mapping: &BTreeMap<usize, String>,
) -> ConfusionMatrix {
    let classes: Vec<usize> = actual
        .iter()
        .chain(predicted)
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let position: BTreeMap<usize, usize> =
        classes.iter().enumerate().map(|(i, c)| (*c, i)).collect();

    let mut matrix = vec![vec![0usize; classes.len()]; classes.len()];
    for (a, p) in actual.iter().zip(predicted) {
        matrix[position[a]][position[p]] += 1;
    }

    ConfusionMatrix {
        labels: classes
            .iter()
            .map(|c| {
                class_mapping
                    .get(c)
                    .cloned()
                    .unwrap_or_else(|| c.to_string())
            })
            .collect(),
        matrix,
    }
}

/// Min-max normalise importances into `[0, 1]`.
///
/// A single importance is returned unchanged. A constant vector of more than
/// one element becomes all zeros.
pub fn normalize_importances(importances: &[f64]) -> Vec<f64> {
    if importances.len() <= 1 {
        return importances.to_vec();
    }

    let min = importances.iter().copied().fold(f64::INFINITY, f64::min);
    let max = importances.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; importances.len()];
    }

    importances.iter().map(|v| (v - min) / range).collect()
}

/// Map class probabilities to the most likely class per row.
///
/// Ties go to the lowest class index.
pub(crate) fn argmax_rows(probabilities: &ndarray::Array2<f64>) -> Vec<usize> {
    probabilities
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
                    if p > best.1 { (i, p) } else { best }
                })
                .0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rmse() {
        assert_eq!(rmse(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert!((rmse(&[0.0, 0.0], &[3.0, 4.0]) - (12.5f64).sqrt()).abs() < 1e-12);
        assert_eq!(rmse(&[], &[]), 0.0);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_confusion_matrix_uses_union_of_classes() {
        let mapping: BTreeMap<usize, String> = [
            (0, "a".to_string()),
            (1, "b".to_string()),
            (2, "c".to_string()),
        ]
        .into();
        // class 1 never occurs in the actual labels but is predicted once
        let cm = confusion_matrix(&[0, 2, 2, 0], &[0, 2, 1, 0], &mapping);

        assert_eq!(cm.labels, vec!["a", "b", "c"]);
        assert_eq!(cm.matrix, vec![vec![2, 0, 0], vec![0, 0, 0], vec![0, 1, 1]]);
    }

    #[test]
    fn test_confusion_matrix_skips_unseen_classes() {
        let mapping: BTreeMap<usize, String> =
            [(0, "a".to_string()), (1, "b".to_string()), (2, "c".to_string())].into();
        let cm = confusion_matrix(&[2, 2], &[2, 0], &mapping);
        assert_eq!(cm.labels, vec!["a", "c"]);
        assert_eq!(cm.matrix, vec![vec![0, 0], vec![1, 1]]);
    }

    #[test]
    fn test_normalize_importances() {
        let normalized = normalize_importances(&[2.0, 6.0, 4.0]);
        assert_eq!(normalized, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_normalize_single_feature_passes_through() {
        assert_eq!(normalize_importances(&[7.0]), vec![7.0]);
        assert!(normalize_importances(&[]).is_empty());
    }

    #[test]
    fn test_normalize_constant_vector_is_zero() {
        assert_eq!(normalize_importances(&[3.0, 3.0, 3.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_argmax_rows() {
        let probs = array![[0.2, 0.8], [0.5, 0.5], [0.7, 0.3]];
        assert_eq!(argmax_rows(&probs), vec![1, 0, 0]);
    }
}
