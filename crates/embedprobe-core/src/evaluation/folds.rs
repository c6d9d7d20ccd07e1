//! Stratified k-fold partitioning.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::labels::class_counts;

/// One train/test split, as ascending row indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition samples into `n_folds` stratified folds.
///
/// Per-fold class allocation is taken by striding through the sorted class
/// codes (`sorted[i::n_folds]`), so fold sizes differ by at most one per
/// class. Within each class, the fold ids are then shuffled with a single
/// seeded generator and assigned to that class's samples in order.
///
/// Classes with fewer members than `n_folds` leave some test folds without
/// that class; callers reject that case before partitioning.
pub fn stratified_k_fold(
    codes: &[usize],
    n_classes: usize,
    n_folds: usize,
    seed: u64,
) -> Vec<Fold> {
    let mut sorted = codes.to_vec();
    sorted.sort_unstable();

    // allocation[f][k] = number of class-k samples in test fold f
    let allocation: Vec<Vec<usize>> = (0..n_folds)
        .map(|f| {
            let strided: Vec<usize> =
                sorted.iter().skip(f).step_by(n_folds).copied().collect();
            class_counts(&strided, n_classes)
        })
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut test_fold = vec![0usize; codes.len()];

    for class in 0..n_classes {
        let mut fold_ids: Vec<usize> = (0..n_folds)
            .flat_map(|f| std::iter::repeat(f).take(allocation[f][class]))
            .collect();
        fold_ids.shuffle(&mut rng);

        let members = codes
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == class)
            .map(|(i, _)| i);
        for (row, fold) in members.zip(fold_ids) {
            test_fold[row] = fold;
        }
    }

    (0..n_folds)
        .map(|f| {
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..codes.len()).partition(|&i| test_fold[i] == f);
            Fold { train, test }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes() -> Vec<usize> {
        // 23 of class 0, 12 of class 1, 7 of class 2
        let mut codes = vec![0; 23];
        codes.extend([1; 12]);
        codes.extend([2; 7]);
        codes.rotate_left(9);
        codes
    }

    #[test]
    fn test_every_sample_tested_exactly_once() {
        let codes = codes();
        let folds = stratified_k_fold(&codes, 3, 5, 42);
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0usize; codes.len()];
        for fold in &folds {
            for &i in &fold.test {
                seen[i] += 1;
            }
            assert_eq!(fold.train.len() + fold.test.len(), codes.len());
            assert!(fold.train.iter().all(|i| !fold.test.contains(i)));
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_class_proportions_are_balanced() {
        let codes = codes();
        let totals = class_counts(&codes, 3);
        for fold in stratified_k_fold(&codes, 3, 5, 42) {
            let test_codes: Vec<usize> = fold.test.iter().map(|&i| codes[i]).collect();
            let per_class = class_counts(&test_codes, 3);
            for (k, &count) in per_class.iter().enumerate() {
                let expected = totals[k] as f64 / 5.0;
                assert!(
                    (count as f64 - expected).abs() <= 1.0,
                    "class {k}: {count} vs {expected}"
                );
            }
        }
    }

    #[test]
    fn test_same_seed_same_folds() {
        let codes = codes();
        assert_eq!(
            stratified_k_fold(&codes, 3, 5, 42),
            stratified_k_fold(&codes, 3, 5, 42)
        );
        assert_ne!(
            stratified_k_fold(&codes, 3, 5, 42),
            stratified_k_fold(&codes, 3, 5, 7)
        );
    }
}
