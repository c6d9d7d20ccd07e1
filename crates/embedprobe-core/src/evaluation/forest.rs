//! Binary random forest over dense `f32` features.
//!
//! Trees are grown on bootstrap samples with Gini impurity, considering a
//! random subset of `max_features` features at every node. Nodes are kept in
//! a flat arena and built with an explicit work stack, so unlimited depth
//! cannot exhaust the call stack.

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Forest hyperparameters.
#[derive(Debug, Clone)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Features considered per split (`None` = sqrt of the feature count)
    pub max_features: Option<usize>,
    /// Maximum depth (`None` = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Draw a bootstrap sample per tree
    pub bootstrap: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_features: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Fraction of positive samples that reached this leaf
        positive: f64,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
}

/// A single fitted classification tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

/// Best split found at a node.
struct SplitCandidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on `samples`, indices into both `x` rows and `targets`.
    ///
    /// `samples` may contain repeats (bootstrap draws); each repeat counts as
    /// one sample.
    fn fit(
        x: ArrayView2<'_, f32>,
        targets: &[bool],
        samples: Vec<usize>,
        max_features: usize,
        params: &ForestParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { positive: 0.0 }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];
        let mut features: Vec<usize> = (0..x.ncols()).collect();

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            let n = samples.len();
            let positives = samples.iter().filter(|&&i| targets[i]).count();
            let positive = if n == 0 {
                0.0
            } else {
                positives as f64 / n as f64
            };

            let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
            let pure = positives == 0 || positives == n;
            if depth_reached || pure || n < params.min_samples_split {
                nodes[node] = Node::Leaf { positive };
                continue;
            }

            features.shuffle(rng);
            let Some(split) = best_split(x, targets, &samples, &features, max_features, params)
            else {
                nodes[node] = Node::Leaf { positive };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { positive: 0.0 });
            nodes.push(Node::Leaf { positive: 0.0 });
            nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        Self { nodes }
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba_one(&self, row: ArrayView1<'_, f32>) -> f64 {
        let mut current = 0;
        loop {
            match self.nodes[current] {
                Node::Leaf { positive } => return positive,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    current = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Number of nodes, leaves included.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Search the shuffled `features` for the split with the lowest weighted
/// child Gini impurity.
///
/// Features that are constant within the node are skipped and do not count
/// toward `max_features`, so a split is found whenever any feature varies.
fn best_split(
    x: ArrayView2<'_, f32>,
    targets: &[bool],
    samples: &[usize],
    features: &[usize],
    max_features: usize,
    params: &ForestParams,
) -> Option<SplitCandidate> {
    let n = samples.len();
    let total_pos = samples.iter().filter(|&&i| targets[i]).count();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut best: Option<SplitCandidate> = None;
    let mut visited = 0;
    let mut column: Vec<(f32, bool)> = Vec::with_capacity(n);

    for &feature in features {
        if visited >= max_features {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&i| (x[[i, feature]], targets[i])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[n - 1].0 {
            continue;
        }
        visited += 1;

        let mut left_pos = 0usize;
        for pos in 1..n {
            if column[pos - 1].1 {
                left_pos += 1;
            }
            if column[pos].0 == column[pos - 1].0 {
                continue;
            }
            let n_left = pos;
            let n_right = n - pos;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = weighted_gini(n_left, left_pos, n_right, total_pos - left_pos);
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: midpoint(column[pos - 1].0, column[pos].0),
                    impurity,
                });
            }
        }
    }

    best
}

/// Midpoint between two distinct values that still separates them.
fn midpoint(low: f32, high: f32) -> f32 {
    let mid = low + (high - low) / 2.0;
    if mid >= high || !mid.is_finite() {
        low
    } else {
        mid
    }
}

fn gini(n: usize, positives: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Sample-weighted mean of the two children's Gini impurity.
fn weighted_gini(n_left: usize, pos_left: usize, n_right: usize, pos_right: usize) -> f64 {
    let n = (n_left + n_right) as f64;
    (n_left as f64 * gini(n_left, pos_left) + n_right as f64 * gini(n_right, pos_right)) / n
}

/// An ensemble of [`DecisionTree`]s whose leaf probabilities are averaged.
#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    /// Fit on the rows of `x` listed in `rows`, with `targets[j]` the label of
    /// `rows[j]`.
    pub fn fit(&mut self, x: ArrayView2<'_, f32>, rows: &[usize], targets: &[bool]) {
        debug_assert_eq!(rows.len(), targets.len());

        // Re-index the row targets so trees can look them up by row.
        let mut row_targets = vec![false; x.nrows()];
        for (&row, &t) in rows.iter().zip(targets) {
            row_targets[row] = t;
        }

        let n_features = x.ncols();
        let max_features = self
            .params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1));

        let mut seeder = ChaCha8Rng::seed_from_u64(self.params.seed);
        self.trees = (0..self.params.n_trees)
            .map(|_| {
                let mut rng = ChaCha8Rng::seed_from_u64(seeder.gen());
                let samples: Vec<usize> = if self.params.bootstrap {
                    (0..rows.len())
                        .map(|_| rows[rng.gen_range(0..rows.len())])
                        .collect()
                } else {
                    rows.to_vec()
                };
                DecisionTree::fit(x, &row_targets, samples, max_features, &self.params, &mut rng)
            })
            .collect();

        tracing::trace!(
            "Fitted {} trees on {} rows ({} features, {} per split)",
            self.trees.len(),
            rows.len(),
            n_features,
            max_features
        );
    }

    /// Mean positive-class probability over all trees for one row.
    pub fn predict_proba_one(&self, row: ArrayView1<'_, f32>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba_one(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Positive-class probability for each of `rows`.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>, rows: &[usize]) -> Vec<f64> {
        rows.iter()
            .map(|&r| self.predict_proba_one(x.row(r)))
            .collect()
    }

    /// The fitted trees.
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}
