use serde::{Deserialize, Serialize};

use crate::vectorizer::SparseVector;

#[derive(Debug, Clone, Copy)]
pub struct SolverParams {
    /// Inverse L2 strength, as in `C` of a regularised logistic regression.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once every gradient component is below this magnitude.
    pub tolerance: f64,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 2000,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverTrace {
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
}

/// Multinomial logistic regression with an unpenalised intercept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxRegression {
    n_features: usize,
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl SoftmaxRegression {
    pub fn n_classes(&self) -> usize {
        self.bias.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_consistent(&self) -> bool {
        !self.bias.is_empty()
            && self.weights.len() == self.bias.len()
            && self.weights.iter().all(|row| row.len() == self.n_features)
    }

    /// Full-batch gradient descent on mean cross-entropy plus
    /// `1 / (2 C n) * ||W||^2`.
    pub fn fit(
        rows: &[SparseVector],
        targets: &[usize],
        n_classes: usize,
        n_features: usize,
        params: &SolverParams,
    ) -> (Self, SolverTrace) {
        let mut model = Self {
            n_features,
            weights: vec![vec![0.0; n_features]; n_classes.max(1)],
            bias: vec![0.0; n_classes.max(1)],
        };

        let n = rows.len().max(1) as f64;
        let lambda = 1.0 / (params.c * n);
        // Rows are unit length, so the loss curvature is bounded by 1 + lambda.
        let step = 1.0 / (1.0 + lambda);

        let mut trace = SolverTrace {
            iterations: 0,
            converged: false,
            final_loss: f64::NAN,
        };

        for iteration in 1..=params.max_iter {
            let mut grad_w = model
                .weights
                .iter()
                .map(|row| row.iter().map(|w| lambda * w).collect::<Vec<_>>())
                .collect::<Vec<_>>();
            let mut grad_b = vec![0.0; model.n_classes()];
            let mut loss = 0.0;

            for (row, &target) in rows.iter().zip(targets) {
                let probs = model.probabilities(row);
                loss -= probs[target].max(f64::MIN_POSITIVE).ln();
                for (class, prob) in probs.iter().enumerate() {
                    let residual = (prob - if class == target { 1.0 } else { 0.0 }) / n;
                    grad_b[class] += residual;
                    for &(feature, value) in row {
                        grad_w[class][feature] += residual * value;
                    }
                }
            }

            let penalty = model
                .weights
                .iter()
                .flatten()
                .map(|w| w * w)
                .sum::<f64>();
            trace.final_loss = loss / n + 0.5 * lambda * penalty;
            trace.iterations = iteration;

            let max_grad = grad_w
                .iter()
                .flatten()
                .chain(grad_b.iter())
                .fold(0.0_f64, |acc, g| acc.max(g.abs()));
            if max_grad < params.tolerance {
                trace.converged = true;
                break;
            }

            for (weights, grads) in model.weights.iter_mut().zip(&grad_w) {
                for (w, g) in weights.iter_mut().zip(grads) {
                    *w -= step * g;
                }
            }
            for (b, g) in model.bias.iter_mut().zip(&grad_b) {
                *b -= step * g;
            }
        }

        (model, trace)
    }

    pub fn probabilities(&self, row: &SparseVector) -> Vec<f64> {
        let scores = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(weights, bias)| {
                bias + row
                    .iter()
                    .filter_map(|&(feature, value)| weights.get(feature).map(|w| w * value))
                    .sum::<f64>()
            })
            .collect::<Vec<_>>();

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp = scores.iter().map(|s| (s - max).exp()).collect::<Vec<_>>();
        let total = exp.iter().sum::<f64>();
        exp.into_iter().map(|e| e / total).collect()
    }

    /// Most probable class; ties go to the lowest class index.
    pub fn predict(&self, row: &SparseVector) -> (usize, f64) {
        self.probabilities(row)
            .into_iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (class, prob)| {
                if prob > best.1 {
                    (class, prob)
                } else {
                    best
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_rows() -> (Vec<SparseVector>, Vec<usize>) {
        let rows = vec![
            vec![(0, 1.0)],
            vec![(0, 0.8), (2, 0.6)],
            vec![(1, 1.0)],
            vec![(1, 0.6), (2, 0.8)],
        ];
        (rows, vec![0, 0, 1, 1])
    }

    #[test]
    fn separates_toy_classes() {
        let (rows, targets) = toy_rows();
        let (model, trace) = SoftmaxRegression::fit(&rows, &targets, 2, 3, &SolverParams::default());

        assert!(trace.converged, "{trace:?}");
        assert!(model.is_consistent());
        assert_eq!(model.predict(&vec![(0, 1.0)]).0, 0);
        assert_eq!(model.predict(&vec![(1, 1.0)]).0, 1);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (rows, targets) = toy_rows();
        let (model, _) = SoftmaxRegression::fit(&rows, &targets, 2, 3, &SolverParams::default());
        let probs = model.probabilities(&vec![(2, 1.0)]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn iteration_cap_is_recorded() {
        let (rows, targets) = toy_rows();
        let params = SolverParams {
            max_iter: 2,
            ..SolverParams::default()
        };
        let (_, trace) = SoftmaxRegression::fit(&rows, &targets, 2, 3, &params);
        assert_eq!(trace.iterations, 2);
        assert!(!trace.converged);
    }

    #[test]
    fn single_class_always_wins() {
        let (model, trace) = SoftmaxRegression::fit(
            &[vec![(0, 1.0)]],
            &[0],
            1,
            1,
            &SolverParams::default(),
        );
        assert!(trace.converged);
        assert_eq!(model.predict(&Vec::new()), (0, 1.0));
    }
}
