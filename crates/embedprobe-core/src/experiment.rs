//! The experiment driver: every text field crossed with every embedder.
//!
//! The plan is a fixed table of fields, each tied to the dataset whose labels
//! it is evaluated against. For each (field, embedder) combination the driver
//! embeds the field's texts, cross-validates a classifier on the result and
//! scores the embedding space as a clustering, then hands the structured
//! result to the caller's callback. Nothing is printed here.

use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::dataset::{Dataset, DatasetSource, TextField};
use crate::embedding::{EmbedderKind, TextEmbedder};
use crate::error::{EvaluationError, ProbeError, Result};
use crate::evaluation::{
    evaluate_clustering, evaluate_supervised, ClusteringScores, CrossValidationReport,
};
use crate::labels::Labels;

/// A text field and the dataset it is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: TextField,
    pub source: DatasetSource,
}

/// Fields in run order. The paper fields come from the filtered dataset; the
/// GitHub title and keywords come from the complete dataset and are scored
/// against that dataset's own labels.
pub const FIELD_PLAN: [FieldSpec; 6] = [
    FieldSpec {
        field: TextField::Title,
        source: DatasetSource::Primary,
    },
    FieldSpec {
        field: TextField::Abstract,
        source: DatasetSource::Primary,
    },
    FieldSpec {
        field: TextField::Readme,
        source: DatasetSource::Primary,
    },
    FieldSpec {
        field: TextField::SomefDescription,
        source: DatasetSource::Primary,
    },
    FieldSpec {
        field: TextField::GithubTitle,
        source: DatasetSource::Complete,
    },
    FieldSpec {
        field: TextField::GithubKeywords,
        source: DatasetSource::Complete,
    },
];

/// Which combinations to run and how to treat failures.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only these fields (all when `None`)
    pub fields: Option<Vec<TextField>>,
    /// Only these embedders (all when `None`)
    pub embedders: Option<Vec<EmbedderKind>>,
    /// Log a failed combination and continue instead of aborting
    pub keep_going: bool,
}

/// Everything measured for one (field, embedder) combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationResult {
    pub field: TextField,
    pub embedder: EmbedderKind,
    pub source: DatasetSource,
    /// Number of records (feature-matrix rows)
    pub samples: usize,
    /// Embedding dimension (feature-matrix columns)
    pub features: usize,
    /// Class names in label-code order
    pub classes: Vec<String>,
    pub cross_validation: CrossValidationReport,
    pub clustering: ClusteringScores,
    /// Time spent producing the feature matrix
    pub embed_ms: u64,
    /// Time spent in cross-validation and clustering scores
    pub evaluate_ms: u64,
}

/// A combination that did not produce a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinationFailure {
    pub field: TextField,
    pub embedder: EmbedderKind,
    pub error: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub results: Vec<CombinationResult>,
    pub failures: Vec<CombinationFailure>,
    pub elapsed_ms: u64,
}

/// Progress notifications sent to the caller while a run is going.
#[derive(Debug)]
pub enum ExperimentEvent<'a> {
    /// A combination is about to be embedded (`index` is 0-based).
    Started {
        field: TextField,
        embedder: EmbedderKind,
        index: usize,
        total: usize,
    },
    Finished(&'a CombinationResult),
    Failed(&'a CombinationFailure),
}

/// Drives the field × embedder plan over a pair of loaded datasets.
pub struct Experiment<'a> {
    primary: &'a Dataset,
    complete: &'a Dataset,
    config: EvaluationConfig,
    options: RunOptions,
}

impl<'a> Experiment<'a> {
    pub fn new(
        primary: &'a Dataset,
        complete: &'a Dataset,
        config: EvaluationConfig,
        options: RunOptions,
    ) -> Self {
        Self {
            primary,
            complete,
            config,
            options,
        }
    }

    /// The combinations this run will execute, in order.
    ///
    /// Embedders are ordered TF-IDF, sentence, CLIP regardless of the order
    /// they were passed in; kinds without an embedder are skipped.
    pub fn plan<'e>(
        &self,
        embedders: &[&'e dyn TextEmbedder],
    ) -> Vec<(FieldSpec, &'e dyn TextEmbedder)> {
        let field_selected = |f: TextField| {
            self.options
                .fields
                .as_ref()
                .map_or(true, |only| only.contains(&f))
        };
        let embedder_selected = |k: EmbedderKind| {
            self.options
                .embedders
                .as_ref()
                .map_or(true, |only| only.contains(&k))
        };

        let ordered: Vec<&'e dyn TextEmbedder> = EmbedderKind::ALL
            .iter()
            .filter(|&&k| embedder_selected(k))
            .filter_map(|&k| embedders.iter().find(|e| e.kind() == k).copied())
            .collect();

        FIELD_PLAN
            .iter()
            .filter(|spec| field_selected(spec.field))
            .flat_map(|&spec| ordered.iter().map(move |&e| (spec, e)))
            .collect()
    }

    /// Run every planned combination, reporting each through `on_event`.
    ///
    /// Without `keep_going` the first failure aborts the run and is returned.
    pub fn run<F>(
        &self,
        embedders: &[&dyn TextEmbedder],
        mut on_event: F,
    ) -> Result<ExperimentSummary>
    where
        F: FnMut(ExperimentEvent<'_>),
    {
        let start = Instant::now();
        let plan = self.plan(embedders);
        let total = plan.len();
        tracing::info!("Running {} combinations", total);

        let primary_labels = Labels::encode(&self.primary.labels());
        let complete_labels = Labels::encode(&self.complete.labels());

        let mut summary = ExperimentSummary::default();

        for (index, (spec, embedder)) in plan.into_iter().enumerate() {
            on_event(ExperimentEvent::Started {
                field: spec.field,
                embedder: embedder.kind(),
                index,
                total,
            });

            let (dataset, labels) = match spec.source {
                DatasetSource::Primary => (self.primary, &primary_labels),
                DatasetSource::Complete => (self.complete, &complete_labels),
            };

            match self.run_one(spec, embedder, dataset, labels) {
                Ok(result) => {
                    on_event(ExperimentEvent::Finished(&result));
                    summary.results.push(result);
                }
                Err(e) if self.options.keep_going => {
                    tracing::warn!("{} / {} failed: {}", spec.field, embedder.kind(), e);
                    let failure = CombinationFailure {
                        field: spec.field,
                        embedder: embedder.kind(),
                        error: e.to_string(),
                    };
                    on_event(ExperimentEvent::Failed(&failure));
                    summary.failures.push(failure);
                }
                Err(e) => return Err(e),
            }
        }

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }

    /// Embed one field and evaluate the resulting matrix.
    pub fn run_one(
        &self,
        spec: FieldSpec,
        embedder: &dyn TextEmbedder,
        dataset: &Dataset,
        labels: &Labels,
    ) -> Result<CombinationResult> {
        let texts = dataset.texts(spec.field);
        tracing::info!(
            "Computing {} embeddings for {} ({} records)",
            embedder.kind(),
            spec.field,
            texts.len()
        );

        let embed_start = Instant::now();
        let x: Array2<f32> = embedder.embed(&texts)?;
        let embed_ms = embed_start.elapsed().as_millis() as u64;

        if x.nrows() != labels.len() {
            return Err(ProbeError::Evaluation(EvaluationError::LengthMismatch {
                rows: x.nrows(),
                labels: labels.len(),
            }));
        }

        let eval_start = Instant::now();
        let cross_validation = evaluate_supervised(x.view(), labels, &self.config)?;
        let clustering = evaluate_clustering(x.view(), labels)?;
        let evaluate_ms = eval_start.elapsed().as_millis() as u64;

        tracing::info!(
            "{} / {}: accuracy {:.4}, silhouette {:.4} ({} ms embed, {} ms evaluate)",
            spec.field,
            embedder.kind(),
            cross_validation.mean.accuracy,
            clustering.silhouette,
            embed_ms,
            evaluate_ms
        );

        Ok(CombinationResult {
            field: spec.field,
            embedder: embedder.kind(),
            source: spec.source,
            samples: x.nrows(),
            features: x.ncols(),
            classes: labels.classes().to_vec(),
            cross_validation,
            clustering,
            embed_ms,
            evaluate_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::PaperRecord;
    use crate::error::EmbeddingError;
    use std::cell::RefCell;

    /// Embeds "vision" texts near +1 and everything else near -1.
    struct KeywordEmbedder {
        kind: EmbedderKind,
        calls: RefCell<Vec<usize>>,
    }

    impl KeywordEmbedder {
        fn new(kind: EmbedderKind) -> Self {
            Self {
                kind,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextEmbedder for KeywordEmbedder {
        fn kind(&self) -> EmbedderKind {
            self.kind
        }

        fn embed(&self, texts: &[String]) -> std::result::Result<Array2<f32>, EmbeddingError> {
            self.calls.borrow_mut().push(texts.len());
            let mut x = Array2::<f32>::zeros((texts.len(), 3));
            for (i, t) in texts.iter().enumerate() {
                let center = if t.contains("vision") { 1.0 } else { -1.0 };
                let jitter = (i % 5) as f32 * 0.05;
                x[[i, 0]] = center + jitter;
                x[[i, 1]] = center - jitter;
                x[[i, 2]] = jitter;
            }
            Ok(x)
        }
    }

    /// Always fails.
    struct BrokenEmbedder;

    impl TextEmbedder for BrokenEmbedder {
        fn kind(&self) -> EmbedderKind {
            EmbedderKind::Clip
        }

        fn embed(&self, _texts: &[String]) -> std::result::Result<Array2<f32>, EmbeddingError> {
            Err(EmbeddingError::Inference {
                model: "broken".to_string(),
                message: "no weights".to_string(),
            })
        }
    }

    fn record(i: usize) -> PaperRecord {
        let (topic, area) = if i % 2 == 0 {
            ("vision", "Computer Vision")
        } else {
            ("language", "Natural Language Processing")
        };
        PaperRecord {
            paper_title: format!("A {topic} paper number {i}"),
            abstract_text: format!("We study {topic}."),
            github_readme_content: format!("{topic} code"),
            somef_descriptions: format!("{topic} tool"),
            github_repo_title: format!("{topic}-{i}"),
            github_keywords: topic.to_string(),
            main_collection_area: area.to_string(),
        }
    }

    fn datasets() -> (Dataset, Dataset) {
        let primary = Dataset::from_records("primary.json", (0..50).map(record).collect());
        let complete = Dataset::from_records("complete.json", (0..40).map(record).collect());
        (primary, complete)
    }

    fn config() -> EvaluationConfig {
        EvaluationConfig {
            n_trees: 10,
            ..EvaluationConfig::default()
        }
    }

    #[test]
    fn test_full_plan_order() {
        let (primary, complete) = datasets();
        let tfidf = KeywordEmbedder::new(EmbedderKind::Tfidf);
        let clip = KeywordEmbedder::new(EmbedderKind::Clip);
        let sentence = KeywordEmbedder::new(EmbedderKind::Sentence);
        let experiment = Experiment::new(&primary, &complete, config(), RunOptions::default());

        let plan = experiment.plan(&[&clip, &tfidf, &sentence]);
        assert_eq!(plan.len(), 18);
        let first: Vec<EmbedderKind> = plan[..3].iter().map(|(_, e)| e.kind()).collect();
        assert_eq!(first, EmbedderKind::ALL.to_vec());
        assert_eq!(plan[0].0.field, TextField::Title);
        assert_eq!(plan[17].0.field, TextField::GithubKeywords);
    }

    #[test]
    fn test_run_separable_fields() {
        let (primary, complete) = datasets();
        let embedder = KeywordEmbedder::new(EmbedderKind::Sentence);
        let options = RunOptions {
            fields: Some(vec![TextField::Title, TextField::GithubKeywords]),
            ..Default::default()
        };
        let experiment = Experiment::new(&primary, &complete, config(), options);

        let mut finished = Vec::new();
        let summary = experiment
            .run(&[&embedder], |event| {
                if let ExperimentEvent::Finished(r) = event {
                    finished.push((r.field, r.samples));
                }
            })
            .unwrap();

        assert_eq!(
            finished,
            vec![(TextField::Title, 50), (TextField::GithubKeywords, 40)]
        );
        assert_eq!(*embedder.calls.borrow(), vec![50, 40]);
        for result in &summary.results {
            assert!(result.cross_validation.mean.accuracy > 0.9);
            assert!(result.clustering.silhouette > 0.5);
            assert_eq!(result.features, 3);
        }
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn test_failure_aborts_by_default() {
        let (primary, complete) = datasets();
        let options = RunOptions {
            fields: Some(vec![TextField::Title]),
            ..Default::default()
        };
        let experiment = Experiment::new(&primary, &complete, config(), options);
        let err = experiment.run(&[&BrokenEmbedder], |_| {}).unwrap_err();
        assert!(matches!(err, ProbeError::Embedding(_)));
    }

    #[test]
    fn test_keep_going_records_failures() {
        let (primary, complete) = datasets();
        let good = KeywordEmbedder::new(EmbedderKind::Tfidf);
        let options = RunOptions {
            fields: Some(vec![TextField::Title]),
            keep_going: true,
            ..Default::default()
        };
        let experiment = Experiment::new(&primary, &complete, config(), options);

        let summary = experiment.run(&[&good, &BrokenEmbedder], |_| {}).unwrap();
        assert_eq!(summary.results.len(), 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].embedder, EmbedderKind::Clip);
        assert!(summary.failures[0].error.contains("no weights"));
    }

    #[test]
    fn test_row_mismatch_is_reported() {
        struct ShortEmbedder;
        impl TextEmbedder for ShortEmbedder {
            fn kind(&self) -> EmbedderKind {
                EmbedderKind::Tfidf
            }
            fn embed(&self, texts: &[String]) -> std::result::Result<Array2<f32>, EmbeddingError> {
                Ok(Array2::zeros((texts.len() - 1, 2)))
            }
        }

        let (primary, complete) = datasets();
        let experiment = Experiment::new(&primary, &complete, config(), RunOptions::default());
        let labels = Labels::encode(&primary.labels());
        let err = experiment
            .run_one(FIELD_PLAN[0], &ShortEmbedder, &primary, &labels)
            .unwrap_err();
        assert!(matches!(
            err,
            ProbeError::Evaluation(EvaluationError::LengthMismatch { rows: 49, labels: 50 })
        ));
    }
}
