//! Categorical label encoding.

use std::collections::BTreeMap;

use serde::Serialize;

/// String labels encoded as dense class indices.
///
/// Classes are numbered in sorted name order, so the same label set always
/// produces the same encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Labels {
    classes: Vec<String>,
    codes: Vec<usize>,
}

impl Labels {
    /// Encode a sequence of labels.
    pub fn encode<S: AsRef<str>>(labels: &[S]) -> Self {
        let index: BTreeMap<&str, usize> = labels
            .iter()
            .map(|l| (l.as_ref(), 0))
            .collect::<BTreeMap<_, _>>()
            .into_keys()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        let codes = labels.iter().map(|l| index[l.as_ref()]).collect();
        let classes = index.keys().map(|s| s.to_string()).collect();

        Self { classes, codes }
    }

    /// Class names, indexed by code.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Class code of every sample.
    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Number of distinct classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Samples per class, indexed by code.
    pub fn class_counts(&self) -> Vec<usize> {
        class_counts(&self.codes, self.n_classes())
    }
}

/// Count occurrences of each code in `0..n_classes`.
pub(crate) fn class_counts(codes: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &c in codes {
        counts[c] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_sorts_classes() {
        let labels = Labels::encode(&["vision", "audio", "vision", "graphs"]);
        assert_eq!(labels.classes(), &["audio", "graphs", "vision"]);
        assert_eq!(labels.codes(), &[2, 0, 2, 1]);
        assert_eq!(labels.class_counts(), vec![1, 1, 2]);
    }

    #[test]
    fn test_encode_empty() {
        let labels = Labels::encode::<String>(&[]);
        assert!(labels.is_empty());
        assert_eq!(labels.n_classes(), 0);
    }
}
