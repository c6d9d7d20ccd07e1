//! Error types for the embedprobe evaluation pipeline.
//!
//! Errors are organized by stage (config, dataset, embedding, evaluation) so a
//! failed run says where it stopped and for which input.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for embedprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset loading errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Embedding model loading or inference errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Supervised or clustering evaluation errors
    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Dataset loading errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset file does not exist
    #[error("Dataset not found: {0}")]
    NotFound(PathBuf),

    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a JSON array of paper records
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A record that must be evaluated has no label
    #[error("Record {index} in {path} has no main_collection_area label")]
    MissingLabel { path: PathBuf, index: usize },

    /// Nothing survived filtering
    #[error("No usable records in {0}")]
    Empty(PathBuf),
}

/// Embedding model loading and inference errors.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// A model or tokenizer file is missing or failed to load
    #[error("Failed to load {model} from {path}: {message}")]
    ModelLoad {
        model: String,
        path: PathBuf,
        message: String,
    },

    /// Tokenization or ONNX inference failed
    #[error("{model} inference failed: {message}")]
    Inference { model: String, message: String },

    /// The TF-IDF vocabulary ended up empty after document-frequency pruning
    #[error("TF-IDF vocabulary is empty after pruning ({documents} documents)")]
    EmptyVocabulary { documents: usize },
}

/// Evaluation errors, raised before any training or scoring happens.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Feature rows and labels are not aligned
    #[error("Feature matrix has {rows} rows but there are {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    /// Fewer distinct classes than the evaluation needs
    #[error("Need at least {required} distinct classes, found {found}")]
    TooFewClasses { found: usize, required: usize },

    /// A class cannot be spread across the folds
    #[error("Class {class:?} has {count} members, fewer than the {n_folds} folds")]
    ClassTooSmall {
        class: String,
        count: usize,
        n_folds: usize,
    },

    /// Clustering scores need at least one point outside every cluster
    #[error("Clustering scores need 2 <= clusters <= samples - 1 (clusters: {clusters}, samples: {samples})")]
    InvalidClusterCount { clusters: usize, samples: usize },

    /// Input matrix has no rows or no columns
    #[error("Feature matrix is empty ({rows}x{cols})")]
    EmptyFeatures { rows: usize, cols: usize },
}

/// Convenience type alias for embedprobe results.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Convenience type alias for evaluation-specific results.
pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;
