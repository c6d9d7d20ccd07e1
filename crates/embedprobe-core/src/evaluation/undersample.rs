//! Random undersampling of every class except the minority.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::labels::class_counts;

/// Select sample positions so every present class keeps only as many samples
/// as the smallest present class.
///
/// The minority class (the first one on a tie) is kept whole and in order.
/// Every other class is drawn without replacement. Output is grouped by class
/// code, ascending.
pub fn undersample_not_minority(codes: &[usize], n_classes: usize, seed: u64) -> Vec<usize> {
    let counts = class_counts(codes, n_classes);
    let minority = counts
        .iter()
        .enumerate()
        .filter(|(_, &n)| n > 0)
        .min_by_key(|(_, &n)| n)
        .map(|(k, _)| k);

    let Some(minority) = minority else {
        return Vec::new();
    };
    let target = counts[minority];

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut selected = Vec::with_capacity(target * n_classes);

    for class in 0..n_classes {
        if counts[class] == 0 {
            continue;
        }
        let members: Vec<usize> = codes
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == class)
            .map(|(i, _)| i)
            .collect();

        if class == minority {
            selected.extend(members);
        } else {
            selected.extend(
                index::sample(&mut rng, members.len(), target)
                    .into_iter()
                    .map(|j| members[j]),
            );
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_class_cut_to_minority() {
        let codes = vec![0, 1, 1, 1, 0, 1, 1, 2, 2, 2, 2, 2, 2];
        let picked = undersample_not_minority(&codes, 3, 42);

        let picked_codes: Vec<usize> = picked.iter().map(|&i| codes[i]).collect();
        assert_eq!(class_counts(&picked_codes, 3), vec![2, 2, 2]);
        // minority kept whole, in order
        assert_eq!(&picked[..2], &[0, 4]);
    }

    #[test]
    fn test_no_duplicates_and_deterministic() {
        let codes: Vec<usize> = (0..40).map(|i| usize::from(i % 5 == 0)).collect();
        let a = undersample_not_minority(&codes, 2, 42);
        let b = undersample_not_minority(&codes, 2, 42);
        assert_eq!(a, b);

        let mut dedup = a.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), a.len());
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_absent_class_ignored() {
        let codes = vec![0, 0, 0, 2];
        let picked = undersample_not_minority(&codes, 3, 42);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[1], 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(undersample_not_minority(&[], 2, 42).is_empty());
    }
}
