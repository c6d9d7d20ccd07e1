//! Console reports for experiment results.
//!
//! Everything here formats to `String` so the run command decides where it
//! goes (stdout, around the progress bar).

use std::fmt::Write as _;

use console::style;
use embedprobe_core::{CombinationResult, ExperimentSummary};

const RULE: &str = "-----------------------------------";

/// Per-fold reports, the cross-validated means and the clustering scores of
/// one combination.
pub fn format_combination(result: &CombinationResult) -> String {
    let embedder = result.embedder.display_name();
    let field = result.field.display_name();
    let mut out = String::new();

    for fold in &result.cross_validation.folds {
        let m = &fold.metrics;
        let _ = writeln!(
            out,
            "{}",
            style(format!(
                "Fold {} results for {embedder} (OvR Random Forest) - {field}:",
                fold.fold
            ))
            .bold()
        );
        let _ = write!(out, "{}", fold.report);
        let _ = writeln!(
            out,
            "Accuracy: {:.4}, Precision: {:.4}, Recall: {:.4}, F1-Score: {:.4}",
            m.accuracy, m.precision, m.recall, m.f1
        );
        let _ = writeln!(out, "{RULE}");
    }

    let mean = &result.cross_validation.mean;
    let _ = writeln!(
        out,
        "{}",
        style(format!(
            "Final cross-validated results for {embedder} (OvR Random Forest) - {field}:"
        ))
        .bold()
        .green()
    );
    let _ = writeln!(out, "Average Accuracy: {:.4}", mean.accuracy);
    let _ = writeln!(out, "Average Precision: {:.4}", mean.precision);
    let _ = writeln!(out, "Average Recall: {:.4}", mean.recall);
    let _ = writeln!(out, "Average F1-Score: {:.4}", mean.f1);
    let _ = writeln!(out);

    let c = &result.clustering;
    let _ = writeln!(
        out,
        "{}",
        style(format!("Clustering metrics for {embedder} - {field}:")).bold()
    );
    let _ = writeln!(out, "  {:<26} {:>10}", "Metric", "Score");
    let _ = writeln!(out, "  {:<26} {:>10.4}", "Silhouette Score", c.silhouette);
    let _ = writeln!(out, "  {:<26} {:>10.4}", "Calinski-Harabasz Index", c.calinski_harabasz);
    let _ = writeln!(out, "  {:<26} {:>10.4}", "Davies-Bouldin Index", c.davies_bouldin);

    out
}

/// One row per combination, in run order.
pub fn format_summary_table(results: &[CombinationResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22} {:<21} {:>8} {:>8} {:>8} {:>8} {:>11} {:>8}",
        "Field", "Embedding", "Acc", "Prec", "Recall", "F1", "CH", "DB"
    );

    for r in results {
        let m = &r.cross_validation.mean;
        let c = &r.clustering;
        let _ = writeln!(
            out,
            "{:<22} {:<21} {:>8.4} {:>8.4} {:>8.4} {:>8.4} {:>11.2} {:>8.4}   silhouette {:.4}",
            r.field.display_name(),
            r.embedder.display_name(),
            m.accuracy,
            m.precision,
            m.recall,
            m.f1,
            c.calinski_harabasz,
            c.davies_bouldin,
            c.silhouette
        );
    }
    out
}

/// Run totals, for stderr.
pub fn format_run_summary(summary: &ExperimentSummary) -> String {
    let mut out = String::new();
    let total = summary.results.len() + summary.failures.len();

    let _ = writeln!(out);
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "               Summary");
    let _ = writeln!(out, "  ====================================");
    let _ = writeln!(out, "    Succeeded:    {:>8}", summary.results.len());
    if !summary.failures.is_empty() {
        let _ = writeln!(out, "    Failed:       {:>8}", summary.failures.len());
    }
    let _ = writeln!(out, "  ------------------------------------");
    let _ = writeln!(out, "    Total:        {:>8}", total);
    let _ = writeln!(
        out,
        "    Duration:     {:>7.1}s",
        summary.elapsed_ms as f64 / 1000.0
    );
    let _ = writeln!(out, "  ====================================");

    for failure in &summary.failures {
        let _ = writeln!(
            out,
            "    {} / {}: {}",
            failure.field.display_name(),
            failure.embedder.display_name(),
            failure.error
        );
    }
    out
}
