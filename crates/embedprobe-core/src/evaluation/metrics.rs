//! Classification metrics and per-class reports.
//!
//! Averages follow the usual conventions: only classes that occur in either
//! the true or the predicted labels are counted, a zero denominator yields 0,
//! and "weighted" means weighted by true support.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accuracy plus support-weighted precision, recall and F1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationMetrics {
    /// Score `predicted` against `truth` (class codes).
    pub fn compute(truth: &[usize], predicted: &[usize]) -> Self {
        let stats = ClassStats::collect(truth, predicted);
        let weighted = stats.weighted_average();
        Self {
            accuracy: accuracy(truth, predicted),
            precision: weighted.precision,
            recall: weighted.recall,
            f1: weighted.f1,
        }
    }

    /// Element-wise mean. Empty input gives all zeros.
    pub fn mean(all: &[ClassificationMetrics]) -> Self {
        if all.is_empty() {
            return Self::default();
        }
        let n = all.len() as f64;
        Self {
            accuracy: all.iter().map(|m| m.accuracy).sum::<f64>() / n,
            precision: all.iter().map(|m| m.precision).sum::<f64>() / n,
            recall: all.iter().map(|m| m.recall).sum::<f64>() / n,
            f1: all.iter().map(|m| m.f1).sum::<f64>() / n,
        }
    }
}

/// Fraction of positions where prediction equals truth.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

/// One line of a [`ClassificationReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision, recall, F1 and support, with accuracy, macro and
/// weighted averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ReportRow>,
    pub accuracy: f64,
    pub macro_avg: ReportRow,
    pub weighted_avg: ReportRow,
}

impl ClassificationReport {
    /// Build a report; `class_names[code]` labels each row.
    pub fn compute(truth: &[usize], predicted: &[usize], class_names: &[String]) -> Self {
        let stats = ClassStats::collect(truth, predicted);
        let name = |code: usize| {
            class_names
                .get(code)
                .cloned()
                .unwrap_or_else(|| code.to_string())
        };

        let classes = stats
            .per_class
            .iter()
            .map(|c| ReportRow {
                label: name(c.code),
                precision: c.precision,
                recall: c.recall,
                f1: c.f1,
                support: c.support,
            })
            .collect();

        let total = truth.len();
        let macro_avg = stats.macro_average();
        let weighted = stats.weighted_average();

        Self {
            classes,
            accuracy: accuracy(truth, predicted),
            macro_avg: ReportRow {
                label: "macro avg".to_string(),
                precision: macro_avg.precision,
                recall: macro_avg.recall,
                f1: macro_avg.f1,
                support: total,
            },
            weighted_avg: ReportRow {
                label: "weighted avg".to_string(),
                precision: weighted.precision,
                recall: weighted.recall,
                f1: weighted.f1,
                support: total,
            },
        }
    }
}

impl fmt::Display for ClassificationReport {
    /// Fixed-width table, two decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|r| r.label.chars().count())
            .chain(std::iter::once(self.weighted_avg.label.len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        let row = |f: &mut fmt::Formatter<'_>, r: &ReportRow| {
            writeln!(
                f,
                "{:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                r.label, r.precision, r.recall, r.f1, r.support
            )
        };

        for r in &self.classes {
            row(f, r)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.weighted_avg.support
        )?;
        row(f, &self.macro_avg)?;
        row(f, &self.weighted_avg)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Prf {
    precision: f64,
    recall: f64,
    f1: f64,
}

struct ClassStat {
    code: usize,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

/// Per-class scores over the union of true and predicted classes, ascending.
struct ClassStats {
    per_class: Vec<ClassStat>,
}

impl ClassStats {
    fn collect(truth: &[usize], predicted: &[usize]) -> Self {
        let mut present: Vec<usize> = truth.iter().chain(predicted).copied().collect();
        present.sort_unstable();
        present.dedup();

        let per_class = present
            .into_iter()
            .map(|code| {
                let mut tp = 0usize;
                let mut fp = 0usize;
                let mut fn_ = 0usize;
                for (&t, &p) in truth.iter().zip(predicted) {
                    match (t == code, p == code) {
                        (true, true) => tp += 1,
                        (false, true) => fp += 1,
                        (true, false) => fn_ += 1,
                        (false, false) => {}
                    }
                }
                let precision = ratio(tp, tp + fp);
                let recall = ratio(tp, tp + fn_);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassStat {
                    code,
                    precision,
                    recall,
                    f1,
                    support: tp + fn_,
                }
            })
            .collect();

        Self { per_class }
    }

    fn macro_average(&self) -> Prf {
        if self.per_class.is_empty() {
            return Prf::default();
        }
        let n = self.per_class.len() as f64;
        Prf {
            precision: self.per_class.iter().map(|c| c.precision).sum::<f64>() / n,
            recall: self.per_class.iter().map(|c| c.recall).sum::<f64>() / n,
            f1: self.per_class.iter().map(|c| c.f1).sum::<f64>() / n,
        }
    }

    fn weighted_average(&self) -> Prf {
        let total: usize = self.per_class.iter().map(|c| c.support).sum();
        if total == 0 {
            return Prf::default();
        }
        let total = total as f64;
        let weigh = |value: fn(&ClassStat) -> f64| {
            self.per_class
                .iter()
                .map(|c| value(c) * c.support as f64)
                .sum::<f64>()
                / total
        };
        Prf {
            precision: weigh(|c| c.precision),
            recall: weigh(|c| c.recall),
            f1: weigh(|c| c.f1),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["ai".to_string(), "bio".to_string(), "physics".to_string()]
    }

    #[test]
    fn test_perfect_prediction() {
        let y = vec![0, 1, 2, 1, 0];
        let m = ClassificationMetrics::compute(&y, &y);
        assert_eq!(
            m,
            ClassificationMetrics {
                accuracy: 1.0,
                precision: 1.0,
                recall: 1.0,
                f1: 1.0
            }
        );
    }

    #[test]
    fn test_weighted_scores() {
        // class 0: tp 1, fp 1, fn 1 -> p .5 r .5
        // class 1: tp 2, fp 1, fn 0 -> p 2/3 r 1
        // class 2: tp 0, fp 0, fn 1 -> p 0 r 0 (zero division gives 0)
        let truth = vec![0, 0, 1, 1, 2];
        let pred = vec![0, 1, 1, 1, 0];
        let m = ClassificationMetrics::compute(&truth, &pred);

        assert!((m.accuracy - 0.6).abs() < 1e-12);
        let precision = (0.5 * 2.0 + (2.0 / 3.0) * 2.0 + 0.0) / 5.0;
        let recall = (0.5 * 2.0 + 1.0 * 2.0 + 0.0) / 5.0;
        assert!((m.precision - precision).abs() < 1e-12);
        assert!((m.recall - recall).abs() < 1e-12);
        // weighted recall equals accuracy
        assert!((m.recall - m.accuracy).abs() < 1e-12);
    }

    #[test]
    fn test_metric_bounds() {
        let truth = vec![0, 1, 2, 0, 1, 2, 2, 2];
        let pred = vec![2, 2, 2, 0, 0, 1, 2, 1];
        let m = ClassificationMetrics::compute(&truth, &pred);
        for v in [m.accuracy, m.precision, m.recall, m.f1] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_predicted_only_class_counts_in_macro_avg() {
        let truth = vec![0, 0];
        let pred = vec![0, 1];
        let report = ClassificationReport::compute(&truth, &pred, &names());
        assert_eq!(report.classes.len(), 2);
        assert_eq!(report.classes[1].label, "bio");
        assert_eq!(report.classes[1].support, 0);
        // macro precision = (1.0 + 0.0) / 2
        assert!((report.macro_avg.precision - 0.5).abs() < 1e-12);
        // weighted by true support, class 1 has none
        assert!((report.weighted_avg.precision - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean() {
        let a = ClassificationMetrics {
            accuracy: 1.0,
            precision: 0.5,
            recall: 0.0,
            f1: 0.25,
        };
        let b = ClassificationMetrics::default();
        let m = ClassificationMetrics::mean(&[a, b]);
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.25);
        assert_eq!(m.f1, 0.125);
        assert_eq!(ClassificationMetrics::mean(&[]), ClassificationMetrics::default());
    }

    #[test]
    fn test_report_layout() {
        let truth = vec![0, 1, 2, 2];
        let pred = vec![0, 1, 2, 1];
        let text = ClassificationReport::compute(&truth, &pred, &names()).to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].ends_with("precision    recall  f1-score   support"));
        assert_eq!(lines[1], "");
        assert!(lines[2].trim_start().starts_with("ai"));
        assert!(lines[4].trim_start().starts_with("physics"));
        assert!(lines[6].trim_start().starts_with("accuracy"));
        assert!(lines[6].contains("0.75"));
        assert!(lines[8].trim_start().starts_with("weighted avg"));
        assert!(lines[8].ends_with('4'));
    }
}
