//! Stratified cross-validation of the one-vs-rest forest classifier.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use super::folds::stratified_k_fold;
use super::forest::ForestParams;
use super::metrics::{ClassificationMetrics, ClassificationReport};
use super::ovr::OneVsRest;
use crate::config::EvaluationConfig;
use crate::error::{EvaluationError, EvaluationResult};
use crate::labels::Labels;

/// Scores of one held-out fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    /// 1-based fold number
    pub fold: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: ClassificationMetrics,
    pub report: ClassificationReport,
}

/// Every fold's scores plus their mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldResult>,
    pub mean: ClassificationMetrics,
}

/// Check that `x` and `labels` can be cross-validated with `n_folds` folds.
pub fn validate(x: ArrayView2<'_, f32>, labels: &Labels, n_folds: usize) -> EvaluationResult<()> {
    if x.nrows() != labels.len() {
        return Err(EvaluationError::LengthMismatch {
            rows: x.nrows(),
            labels: labels.len(),
        });
    }
    if labels.n_classes() < 2 {
        return Err(EvaluationError::TooFewClasses {
            found: labels.n_classes(),
            required: 2,
        });
    }
    if x.ncols() == 0 {
        return Err(EvaluationError::EmptyFeatures {
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }
    for (class, &count) in labels.classes().iter().zip(&labels.class_counts()) {
        if count < n_folds {
            return Err(EvaluationError::ClassTooSmall {
                class: class.clone(),
                count,
                n_folds,
            });
        }
    }
    Ok(())
}

/// Cross-validate a one-vs-rest random forest on `x`.
///
/// All inputs are validated before any training starts. Each fold trains on
/// the remaining folds and is scored on its own test rows.
pub fn evaluate_supervised(
    x: ArrayView2<'_, f32>,
    labels: &Labels,
    config: &EvaluationConfig,
) -> EvaluationResult<CrossValidationReport> {
    validate(x, labels, config.n_folds)?;

    let codes = labels.codes();
    let n_classes = labels.n_classes();
    let params = ForestParams {
        n_trees: config.n_trees,
        seed: config.seed,
        ..ForestParams::default()
    };

    let folds = stratified_k_fold(codes, n_classes, config.n_folds, config.seed);
    let mut results = Vec::with_capacity(folds.len());

    for (i, fold) in folds.iter().enumerate() {
        let train_codes: Vec<usize> = fold.train.iter().map(|&r| codes[r]).collect();
        let test_codes: Vec<usize> = fold.test.iter().map(|&r| codes[r]).collect();

        let model = OneVsRest::fit(x, &fold.train, &train_codes, n_classes, &params);
        let predicted = model.predict(x, &fold.test);

        let metrics = ClassificationMetrics::compute(&test_codes, &predicted);
        let report = ClassificationReport::compute(&test_codes, &predicted, labels.classes());

        tracing::debug!(
            "Fold {}/{}: accuracy {:.4}, f1 {:.4}",
            i + 1,
            folds.len(),
            metrics.accuracy,
            metrics.f1
        );

        results.push(FoldResult {
            fold: i + 1,
            train_size: fold.train.len(),
            test_size: fold.test.len(),
            metrics,
            report,
        });
    }

    let per_fold: Vec<ClassificationMetrics> = results.iter().map(|r| r.metrics).collect();
    Ok(CrossValidationReport {
        mean: ClassificationMetrics::mean(&per_fold),
        folds: results,
    })
}
