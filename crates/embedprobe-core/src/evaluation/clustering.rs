//! Cluster-quality scores with the labels as fixed cluster assignments.
//!
//! All distances are Euclidean.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{EvaluationError, EvaluationResult};
use crate::labels::{class_counts, Labels};
use crate::math::{centroid, distance_to_point, euclidean, point_distance};

/// Silhouette, Calinski-Harabasz and Davies-Bouldin scores of one embedding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusteringScores {
    /// Mean silhouette coefficient, in [-1, 1]; higher is better.
    pub silhouette: f64,
    /// Between/within dispersion ratio; higher is better.
    pub calinski_harabasz: f64,
    /// Mean worst-case cluster similarity; lower is better.
    pub davies_bouldin: f64,
}

/// Score the embedding `x` against the label partition.
///
/// Needs one row per label and between 2 and N-1 distinct labels.
pub fn evaluate_clustering(
    x: ArrayView2<'_, f32>,
    labels: &Labels,
) -> EvaluationResult<ClusteringScores> {
    if x.nrows() != labels.len() {
        return Err(EvaluationError::LengthMismatch {
            rows: x.nrows(),
            labels: labels.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(EvaluationError::EmptyFeatures {
            rows: x.nrows(),
            cols: x.ncols(),
        });
    }

    let clusters = Clusters::new(labels.codes(), labels.n_classes());
    let k = clusters.members.len();
    if k < 2 || k >= x.nrows() {
        return Err(EvaluationError::InvalidClusterCount {
            clusters: k,
            samples: x.nrows(),
        });
    }

    Ok(ClusteringScores {
        silhouette: silhouette(x, &clusters),
        calinski_harabasz: calinski_harabasz(x, &clusters),
        davies_bouldin: davies_bouldin(x, &clusters),
    })
}

/// Rows grouped by cluster, with empty clusters dropped and codes compacted.
struct Clusters {
    /// Compact cluster index of every row.
    assignment: Vec<usize>,
    /// Rows of each compact cluster.
    members: Vec<Vec<usize>>,
}

impl Clusters {
    fn new(codes: &[usize], n_classes: usize) -> Self {
        let counts = class_counts(codes, n_classes);
        let mut compact = vec![usize::MAX; n_classes];
        let mut next = 0;
        for (code, &count) in counts.iter().enumerate() {
            if count > 0 {
                compact[code] = next;
                next += 1;
            }
        }

        let assignment: Vec<usize> = codes.iter().map(|&c| compact[c]).collect();
        let mut members = vec![Vec::new(); next];
        for (row, &c) in assignment.iter().enumerate() {
            members[c].push(row);
        }

        Self {
            assignment,
            members,
        }
    }
}

/// Mean of `(b - a) / max(a, b)` over all points; singleton clusters score 0.
///
/// Distances are computed one row at a time, so memory stays O(N·k).
fn silhouette(x: ArrayView2<'_, f32>, clusters: &Clusters) -> f64 {
    let n = x.nrows();
    let k = clusters.members.len();

    // sums[i][c] = total distance from row i to the members of cluster c
    let mut sums = vec![vec![0.0f64; k]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(x.row(i), x.row(j));
            sums[i][clusters.assignment[j]] += d;
            sums[j][clusters.assignment[i]] += d;
        }
    }

    let total: f64 = (0..n)
        .map(|i| {
            let own = clusters.assignment[i];
            let own_size = clusters.members[own].len();
            if own_size <= 1 {
                return 0.0;
            }
            let a = sums[i][own] / (own_size - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own)
                .map(|c| sums[i][c] / clusters.members[c].len() as f64)
                .fold(f64::INFINITY, f64::min);
            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .sum();

    total / n as f64
}

/// `[B / (k - 1)] / [W / (N - k)]`; 1.0 when the within dispersion is zero.
fn calinski_harabasz(x: ArrayView2<'_, f32>, clusters: &Clusters) -> f64 {
    let n = x.nrows();
    let k = clusters.members.len();
    let all_rows: Vec<usize> = (0..n).collect();
    let overall = centroid(x, &all_rows);

    let mut between = 0.0;
    let mut within = 0.0;
    for rows in &clusters.members {
        let c = centroid(x, rows);
        between += rows.len() as f64 * point_distance(&c, &overall).powi(2);
        within += rows
            .iter()
            .map(|&r| distance_to_point(x.row(r), &c).powi(2))
            .sum::<f64>();
    }

    if within == 0.0 {
        1.0
    } else {
        between * (n - k) as f64 / (within * (k - 1) as f64)
    }
}

/// Mean over clusters of the worst `(s_i + s_j) / d(c_i, c_j)`.
fn davies_bouldin(x: ArrayView2<'_, f32>, clusters: &Clusters) -> f64 {
    let k = clusters.members.len();
    let centroids: Vec<Vec<f64>> = clusters.members.iter().map(|r| centroid(x, r)).collect();
    let spread: Vec<f64> = clusters
        .members
        .iter()
        .zip(&centroids)
        .map(|(rows, c)| {
            rows.iter()
                .map(|&r| distance_to_point(x.row(r), c))
                .sum::<f64>()
                / rows.len() as f64
        })
        .collect();

    let mut separation = vec![vec![0.0f64; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            let d = point_distance(&centroids[i], &centroids[j]);
            separation[i][j] = d;
            separation[j][i] = d;
        }
    }

    let near_zero = |v: f64| v.abs() <= 1e-8;
    if spread.iter().all(|&s| near_zero(s)) || separation.iter().flatten().all(|&d| near_zero(d)) {
        return 0.0;
    }

    let total: f64 = (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i && separation[i][j] != 0.0)
                .map(|j| (spread[i] + spread[j]) / separation[i][j])
                .fold(0.0, f64::max)
        })
        .sum();

    total / k as f64
}
