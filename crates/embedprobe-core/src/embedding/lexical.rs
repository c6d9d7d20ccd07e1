//! TF-IDF as an embedding strategy.

use ndarray::Array2;

use super::{EmbedderKind, TextEmbedder};
use crate::config::TfidfConfig;
use crate::error::EmbeddingError;
use crate::text::{preprocess_text, TfidfVectorizer};

/// Preprocesses every text and fits a fresh vectorizer per call.
///
/// Each (field, embedder) combination gets its own vocabulary; nothing is
/// carried between calls.
#[derive(Debug, Clone)]
pub struct TfidfEmbedder {
    vectorizer: TfidfVectorizer,
}

impl TfidfEmbedder {
    pub fn new(config: TfidfConfig) -> Self {
        Self {
            vectorizer: TfidfVectorizer::new(config),
        }
    }
}

impl Default for TfidfEmbedder {
    fn default() -> Self {
        Self::new(TfidfConfig::default())
    }
}

impl TextEmbedder for TfidfEmbedder {
    fn kind(&self) -> EmbedderKind {
        EmbedderKind::Tfidf
    }

    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, EmbeddingError> {
        let cleaned: Vec<String> = texts.iter().map(|t| preprocess_text(t)).collect();
        let matrix = self.vectorizer.fit_transform(&cleaned)?;
        tracing::debug!(
            "TF-IDF fitted on {} documents, {} features",
            matrix.nrows(),
            matrix.ncols()
        );
        Ok(matrix)
    }
}
