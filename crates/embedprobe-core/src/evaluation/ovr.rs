//! One-vs-rest multiclass classification over undersampled binary forests.

use ndarray::ArrayView2;

use super::forest::{ForestParams, RandomForest};
use super::undersample::undersample_not_minority;

#[derive(Debug, Clone)]
enum BinaryModel {
    /// Training labels were all one value.
    Constant(f64),
    Forest(RandomForest),
}

impl BinaryModel {
    fn predict_proba(&self, x: ArrayView2<'_, f32>, rows: &[usize]) -> Vec<f64> {
        match self {
            BinaryModel::Constant(p) => vec![*p; rows.len()],
            BinaryModel::Forest(forest) => forest.predict_proba(x, rows),
        }
    }
}

/// One binary model per class, each trained "this class" against the rest.
#[derive(Debug, Clone)]
pub struct OneVsRest {
    models: Vec<BinaryModel>,
}

impl OneVsRest {
    /// Fit one model per class code in `0..n_classes`.
    ///
    /// For each class the binary targets are rebalanced by undersampling the
    /// majority side down to the minority count before the forest is grown.
    /// Every sub-problem uses the same seed.
    pub fn fit(
        x: ArrayView2<'_, f32>,
        rows: &[usize],
        codes: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Self {
        let models = (0..n_classes)
            .map(|class| {
                let targets: Vec<usize> =
                    codes.iter().map(|&c| usize::from(c == class)).collect();
                let positives = targets.iter().filter(|&&t| t == 1).count();

                if positives == 0 || positives == targets.len() {
                    tracing::debug!("Class {class}: constant sub-problem ({positives} positives)");
                    let p = if positives == 0 { 0.0 } else { 1.0 };
                    return BinaryModel::Constant(p);
                }

                let picked = undersample_not_minority(&targets, 2, params.seed);
                let sub_rows: Vec<usize> = picked.iter().map(|&j| rows[j]).collect();
                let sub_targets: Vec<bool> = picked.iter().map(|&j| targets[j] == 1).collect();

                tracing::trace!(
                    "Class {class}: {} positives, {} rows after undersampling",
                    positives,
                    sub_rows.len()
                );

                let mut forest = RandomForest::new(params.clone());
                forest.fit(x, &sub_rows, &sub_targets);
                BinaryModel::Forest(forest)
            })
            .collect();

        Self { models }
    }

    /// Positive-class probability of every class model, `[row][class]`.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>, rows: &[usize]) -> Vec<Vec<f64>> {
        let per_class: Vec<Vec<f64>> = self
            .models
            .iter()
            .map(|m| m.predict_proba(x, rows))
            .collect();

        (0..rows.len())
            .map(|r| per_class.iter().map(|probs| probs[r]).collect())
            .collect()
    }

    /// Class with the highest positive probability for each row; the lowest
    /// class code wins ties.
    pub fn predict(&self, x: ArrayView2<'_, f32>, rows: &[usize]) -> Vec<usize> {
        self.predict_proba(x, rows)
            .iter()
            .map(|probs| {
                let mut best = 0;
                for (k, &p) in probs.iter().enumerate() {
                    if p > probs[best] {
                        best = k;
                    }
                }
                best
            })
            .collect()
    }

    /// Number of class models.
    pub fn n_classes(&self) -> usize {
        self.models.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    /// Three well separated clusters around (0, 0), (10, 10) and (20, 20).
    fn three_clusters() -> (Array2<f32>, Vec<usize>) {
        let mut x = Array2::<f32>::zeros((30, 2));
        let mut codes = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            x[[i, 0]] = class as f32 * 10.0 + (i / 3) as f32 * 0.1;
            x[[i, 1]] = class as f32 * 10.0 + (i % 7) as f32 * 0.1;
            codes.push(class);
        }
        (x, codes)
    }

    #[test]
    fn test_predicts_separated_clusters() {
        let (x, codes) = three_clusters();
        let rows: Vec<usize> = (0..30).collect();
        let params = ForestParams {
            n_trees: 10,
            ..Default::default()
        };
        let model = OneVsRest::fit(x.view(), &rows, &codes, 3, &params);
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.predict(x.view(), &rows), codes);
    }

    #[test]
    fn test_absent_class_is_constant_zero() {
        let (x, codes) = three_clusters();
        let rows: Vec<usize> = (0..30).collect();
        let params = ForestParams {
            n_trees: 5,
            ..Default::default()
        };
        // declare a fourth class that never occurs
        let model = OneVsRest::fit(x.view(), &rows, &codes, 4, &params);
        let probs = model.predict_proba(x.view(), &rows);
        assert!(probs.iter().all(|p| p.len() == 4 && p[3] == 0.0));
    }

    #[test]
    fn test_ties_go_to_first_class() {
        let x = Array2::<f32>::zeros((2, 1));
        let model = OneVsRest {
            models: vec![BinaryModel::Constant(0.5), BinaryModel::Constant(0.5)],
        };
        assert_eq!(model.predict(x.view(), &[0, 1]), vec![0, 0]);
    }
}
