//! embedprobe core - embedding comparison for paper metadata.
//!
//! embedprobe measures how well different text representations of academic
//! papers predict the paper's research area. Every text field of a paper
//! (title, abstract, README, generated description, repository title,
//! keywords) is embedded three ways and each embedding is scored twice:
//!
//! ```text
//! JSON records → field texts → {TF-IDF, MiniLM, CLIP} → N×D matrix
//!     → 5-fold one-vs-rest random forest  (accuracy, weighted P/R/F1)
//!     → label clustering quality          (silhouette, CH, DB)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use embedprobe_core::embedding::{EmbeddingModels, TextEmbedder, TfidfEmbedder};
//! use embedprobe_core::{Config, Dataset, Experiment, RunOptions};
//!
//! let config = Config::load()?;
//! let primary = Dataset::load_primary(&config.primary_data_path())?;
//! let complete = Dataset::load_complete(&config.complete_data_path())?;
//! let models = EmbeddingModels::load(&config.embedding, &config.model_dir())?;
//! let tfidf = TfidfEmbedder::new(config.tfidf.clone());
//!
//! let experiment = Experiment::new(&primary, &complete, config.evaluation.clone(), RunOptions::default());
//! let embedders: [&dyn TextEmbedder; 3] = [&tfidf, models.sentence(), models.clip()];
//! let summary = experiment.run(&embedders, |_| {})?;
//! ```

pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod labels;
pub mod math;
pub mod output;
pub mod text;

pub use config::Config;
pub use dataset::{Dataset, DatasetSource, PaperRecord, TextField};
pub use embedding::{EmbedderKind, EmbeddingModels, TextEmbedder};
pub use error::{
    ConfigError, DatasetError, EmbeddingError, EvaluationError, EvaluationResult, ProbeError,
    Result,
};
pub use evaluation::{ClassificationMetrics, ClassificationReport, ClusteringScores};
pub use experiment::{
    CombinationFailure, CombinationResult, Experiment, ExperimentEvent, ExperimentSummary,
    RunOptions, FIELD_PLAN,
};
pub use labels::Labels;
pub use output::{OutputFormat, ResultWriter};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
