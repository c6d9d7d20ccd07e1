//! Text embedding producers.
//!
//! Three strategies share one contract, [`TextEmbedder`]: a slice of strings
//! in, an N×D `f32` matrix out, row `i` belonging to string `i`.
//!
//! - [`TfidfEmbedder`]: preprocessed text through a freshly fitted TF-IDF
//!   vectorizer (F <= 3000 columns, refit on every call).
//! - [`SentenceEncoder`]: all-MiniLM-L6-v2 via ONNX Runtime, mean-pooled and
//!   L2-normalized (384 columns).
//! - [`ClipTextEncoder`]: the CLIP ViT-B/32 text tower via ONNX Runtime,
//!   projected text features (512 columns).
//!
//! The two dense encoders are loaded once into [`EmbeddingModels`] and
//! borrowed for the whole run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use embedprobe_core::embedding::{EmbeddingModels, TextEmbedder};
//! use embedprobe_core::Config;
//!
//! let config = Config::default();
//! let models = EmbeddingModels::load(&config.embedding, &config.model_dir())?;
//! let matrix = models.sentence().embed(&titles)?;
//! assert_eq!(matrix.nrows(), titles.len());
//! ```

pub(crate) mod batch;
pub mod clip;
pub mod lexical;
pub(crate) mod onnx;
pub mod sentence;

use std::fmt;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

pub use self::batch::embed_in_batches;
pub use self::clip::ClipTextEncoder;
pub use self::lexical::TfidfEmbedder;
pub use self::sentence::SentenceEncoder;

/// Identifies an embedding strategy in plans and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    Tfidf,
    Sentence,
    Clip,
}

impl EmbedderKind {
    /// All strategies in experiment order.
    pub const ALL: [EmbedderKind; 3] = [
        EmbedderKind::Tfidf,
        EmbedderKind::Sentence,
        EmbedderKind::Clip,
    ];

    /// Human-readable name used in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            EmbedderKind::Tfidf => "TF-IDF",
            EmbedderKind::Sentence => "Sentence Transformer",
            EmbedderKind::Clip => "CLIP",
        }
    }
}

impl fmt::Display for EmbedderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A strategy that turns strings into a feature matrix.
pub trait TextEmbedder {
    /// Which strategy this is.
    fn kind(&self) -> EmbedderKind;

    /// Embed `texts` into an N×D matrix, row order matching input order.
    fn embed(&self, texts: &[String]) -> Result<Array2<f32>, EmbeddingError>;
}

/// The pretrained encoders, loaded once and shared read-only.
pub struct EmbeddingModels {
    sentence: SentenceEncoder,
    clip: ClipTextEncoder,
}

impl EmbeddingModels {
    /// Load both encoders from `model_dir`.
    ///
    /// Fails with [`EmbeddingError::ModelLoad`] naming the missing model, so a
    /// run stops before any dataset work starts.
    pub fn load(config: &EmbeddingConfig, model_dir: &Path) -> Result<Self, EmbeddingError> {
        let sentence = SentenceEncoder::load(config, model_dir)?;
        let clip = ClipTextEncoder::load(config, model_dir)?;
        Ok(Self { sentence, clip })
    }

    /// The sentence-transformer encoder.
    pub fn sentence(&self) -> &SentenceEncoder {
        &self.sentence
    }

    /// The CLIP text encoder.
    pub fn clip(&self) -> &ClipTextEncoder {
        &self.clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_order_and_names() {
        let names: Vec<&str> = EmbedderKind::ALL.iter().map(|k| k.display_name()).collect();
        assert_eq!(names, vec!["TF-IDF", "Sentence Transformer", "CLIP"]);
    }

    #[test]
    fn test_load_without_models_reports_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddingModels::load(&EmbeddingConfig::default(), dir.path())
            .err()
            .unwrap();
        assert!(matches!(err, EmbeddingError::ModelLoad { .. }));
        assert!(err.to_string().contains("all-MiniLM-L6-v2"));
    }
}
