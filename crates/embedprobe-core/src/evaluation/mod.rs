//! Supervised and unsupervised scoring of a feature matrix against labels.
//!
//! - [`evaluate_supervised`]: stratified k-fold cross-validation of a
//!   one-vs-rest random forest, each binary sub-problem rebalanced by
//!   undersampling. Reports accuracy and weighted precision/recall/F1 per fold
//!   and averaged.
//! - [`evaluate_clustering`]: silhouette, Calinski-Harabasz and
//!   Davies-Bouldin scores using the labels as the clustering.
//!
//! Both validate their inputs up front and return an
//! [`EvaluationError`](crate::error::EvaluationError) before doing any work.

pub mod clustering;
pub mod folds;
pub mod forest;
pub mod metrics;
pub mod ovr;
pub mod supervised;
pub mod undersample;

pub use clustering::{evaluate_clustering, ClusteringScores};
pub use folds::{stratified_k_fold, Fold};
pub use forest::{ForestParams, RandomForest};
pub use metrics::{ClassificationMetrics, ClassificationReport, ReportRow};
pub use ovr::OneVsRest;
pub use supervised::{evaluate_supervised, CrossValidationReport, FoldResult};
pub use undersample::undersample_not_minority;
