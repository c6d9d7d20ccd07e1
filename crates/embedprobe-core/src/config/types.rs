//! Sub-configuration structs and their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where ONNX models and tokenizers are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.embedprobe/models"),
        }
    }
}

/// Input dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Filtered dataset; records with any missing field are dropped
    pub primary: PathBuf,

    /// Complete dataset; supplies the GitHub title/keyword fields and their labels
    pub complete: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("data/filtered_data.json"),
            complete: PathBuf::from("data/filtered_data_complete.json"),
        }
    }
}

/// Dense embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Texts per inference call
    pub batch_size: usize,

    /// Sentence-transformer model directory name under `model_dir`
    pub sentence_model: String,

    /// Token limit for the sentence model
    pub sentence_max_length: usize,

    /// CLIP model directory name under `model_dir`
    pub clip_model: String,

    /// Token limit for the CLIP text tower (its position table holds 77)
    pub clip_max_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            sentence_model: "all-MiniLM-L6-v2".to_string(),
            sentence_max_length: 256,
            clip_model: "clip-vit-base-patch32".to_string(),
            clip_max_length: 77,
        }
    }
}

/// TF-IDF vectorizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TfidfConfig {
    /// Minimum number of documents a term must appear in
    pub min_df: usize,

    /// Maximum share of documents a term may appear in
    pub max_df: f64,

    /// Smallest n-gram length
    pub ngram_min: usize,

    /// Largest n-gram length
    pub ngram_max: usize,

    /// Vocabulary cap, keeping the most frequent terms
    pub max_features: usize,
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            min_df: 2,
            max_df: 0.95,
            ngram_min: 1,
            ngram_max: 2,
            max_features: 3000,
        }
    }
}

/// Cross-validation and classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of stratified folds
    pub n_folds: usize,

    /// Trees per random forest
    pub n_trees: usize,

    /// Seed shared by fold shuffling, undersampling and the forests
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            n_folds: 5,
            n_trees: 100,
            seed: 42,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
