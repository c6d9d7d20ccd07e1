//! TF-IDF vectorization over a batch of documents.
//!
//! Tokens are runs of two or more word characters, lowercased, with the
//! scikit-learn English stopwords removed before n-grams are formed. The
//! vocabulary is pruned by document frequency, capped by corpus frequency and
//! laid out in alphabetical order. Weights use smoothed idf and every row is
//! L2-normalized.

use std::collections::HashMap;

use ndarray::Array2;

use super::stopwords;
use crate::config::TfidfConfig;
use crate::error::EmbeddingError;

/// Unfitted vectorizer holding the pruning configuration.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    config: TfidfConfig,
}

/// A fitted vocabulary with its idf weights.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    config: TfidfConfig,
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    pub fn new(config: TfidfConfig) -> Self {
        Self { config }
    }

    /// Learn vocabulary and idf from `documents`.
    pub fn fit(&self, documents: &[String]) -> Result<TfidfModel, EmbeddingError> {
        let n_docs = documents.len();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let counts = term_counts(doc, &self.config);
            for (term, count) in counts {
                *term_freq.entry(term.clone()).or_insert(0) += count;
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(EmbeddingError::EmptyVocabulary { documents: n_docs });
        }

        let max_doc_count = self.config.max_df * n_docs as f64;
        let mut kept: Vec<(String, usize)> = term_freq
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq[term];
                df >= self.config.min_df && df as f64 <= max_doc_count
            })
            .collect();

        if kept.is_empty() {
            return Err(EmbeddingError::EmptyVocabulary { documents: n_docs });
        }

        // Most frequent first; alphabetical among equals so the cut is stable.
        kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        kept.truncate(self.config.max_features);

        let mut vocabulary: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort();

        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq[term] as f64;
                (((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0) as f32
            })
            .collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        tracing::debug!(
            "Fitted TF-IDF vocabulary of {} terms over {} documents",
            vocabulary.len(),
            n_docs
        );

        Ok(TfidfModel {
            config: self.config.clone(),
            vocabulary,
            index,
            idf,
        })
    }

    /// Fit on `documents` and return their dense TF-IDF matrix.
    pub fn fit_transform(&self, documents: &[String]) -> Result<Array2<f32>, EmbeddingError> {
        Ok(self.fit(documents)?.transform(documents))
    }
}

impl TfidfModel {
    /// Terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Idf weight per column.
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    /// Dense N×F matrix of L2-normalized TF-IDF rows. Unknown terms are ignored.
    pub fn transform(&self, documents: &[String]) -> Array2<f32> {
        let mut matrix = Array2::<f32>::zeros((documents.len(), self.vocabulary.len()));

        for (mut row, doc) in matrix.outer_iter_mut().zip(documents) {
            for (term, count) in term_counts(doc, &self.config) {
                if let Some(&col) = self.index.get(&term) {
                    row[col] = count as f32 * self.idf[col];
                }
            }
            if let Some(slice) = row.as_slice_mut() {
                crate::math::l2_normalize_in_place(slice);
            }
        }

        matrix
    }
}

/// Lowercased word tokens of length >= 2 with stopwords removed.
fn tokenize(doc: &str) -> Vec<String> {
    let stop = stopwords::sklearn_english();
    doc.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2 && !stop.contains(token))
        .map(str::to_string)
        .collect()
}

/// Count every n-gram of the configured range in one document.
fn term_counts(doc: &str, config: &TfidfConfig) -> HashMap<String, usize> {
    let tokens = tokenize(doc);
    let mut counts = HashMap::new();

    for n in config.ngram_min..=config.ngram_max {
        if n == 1 {
            for token in &tokens {
                *counts.entry(token.clone()).or_insert(0) += 1;
            }
        } else {
            for window in tokens.windows(n) {
                *counts.entry(window.join(" ")).or_insert(0) += 1;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_short_tokens_and_stopwords() {
        assert_eq!(
            tokenize("A graph of the Neural-Net x2"),
            vec!["graph", "neural", "net", "x2"]
        );
    }

    #[test]
    fn test_bigrams_skip_removed_stopwords() {
        let counts = term_counts("deep the learning", &TfidfConfig::default());
        assert_eq!(counts.get("deep learning"), Some(&1));
        assert_eq!(counts.get("deep"), Some(&1));
    }

    #[test]
    fn test_min_df_prunes_rare_terms() {
        let err = TfidfVectorizer::new(TfidfConfig::default())
            .fit(&docs(&["graph neural", "graph vision", "graph audio"]))
            .unwrap_err();
        // "graph" is in every document (df 3 > 0.95 * 3), everything else has df 1.
        assert!(matches!(err, EmbeddingError::EmptyVocabulary { documents: 3 }));
    }

    #[test]
    fn test_vocabulary_sorted_and_df_filtered() {
        let corpus = docs(&[
            "graph neural network",
            "graph neural model",
            "vision model",
            "audio model",
            "speech audio",
        ]);
        let model = TfidfVectorizer::new(TfidfConfig::default())
            .fit(&corpus)
            .unwrap();
        assert_eq!(
            model.vocabulary(),
            &["audio", "graph", "graph neural", "model", "neural"]
        );
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let corpus = docs(&[
            "graph graph graph model",
            "graph model vision",
            "vision model",
            "audio other",
            "audio other",
        ]);
        let config = TfidfConfig {
            max_features: 2,
            ngram_max: 1,
            ..TfidfConfig::default()
        };
        let model = TfidfVectorizer::new(config).fit(&corpus).unwrap();
        assert_eq!(model.vocabulary(), &["graph", "model"]);
    }

    #[test]
    fn test_rows_are_unit_norm_or_zero() {
        let corpus = docs(&[
            "graph neural network",
            "graph neural model",
            "vision model",
            "nothing shared here",
            "audio model",
        ]);
        let matrix = TfidfVectorizer::new(TfidfConfig::default())
            .fit_transform(&corpus)
            .unwrap();

        assert_eq!(matrix.nrows(), 5);
        for (i, row) in matrix.outer_iter().enumerate() {
            let norm: f32 = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            if i == 3 {
                assert_eq!(norm, 0.0);
            } else {
                assert!((norm - 1.0).abs() < 1e-5, "row {i} norm {norm}");
            }
        }
    }

    #[test]
    fn test_smoothed_idf() {
        let corpus = docs(&["graph model", "graph vision", "vision model", "audio"]);
        let model = TfidfVectorizer::new(TfidfConfig::default())
            .fit(&corpus)
            .unwrap();
        let expected = ((1.0f64 + 4.0) / (1.0 + 2.0)).ln() + 1.0;
        for &w in model.idf() {
            assert!((w as f64 - expected).abs() < 1e-6);
        }
    }
}
