//! Trained one-vs-one model and pairwise voting

use crate::core::{Prediction, Result, SVMError, SVMModel, SolverConfig, SparseVector};
use crate::kernel::{Kernel, RBFKernel};
use crate::multiclass::grouping::{class_pairs, pair_count, prefix_offsets};
use std::sync::Arc;

/// Multi-class model assembled from every pairwise classifier
///
/// Support vectors are stored once, grouped by class. The classifier for
/// classes `(i, j)` keeps the coefficients of class `i` in row `j - 1` and
/// those of class `j` in row `i`, each at the offset range of that class's
/// support vectors, so any class's contribution to a pair is contiguous.
#[derive(Debug, Clone)]
pub struct MulticlassModel {
    config: SolverConfig,
    kernel: RBFKernel,
    labels: Vec<f64>,
    sv_count_per_class: Vec<usize>,
    support_vectors: Vec<Arc<SparseVector>>,
    sv_indices: Vec<usize>,
    coefficients: Vec<Vec<f64>>,
    bias: Vec<f64>,
}

impl MulticlassModel {
    /// Assemble a model from its parts, checking that all shapes agree
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        config: SolverConfig,
        labels: Vec<f64>,
        sv_count_per_class: Vec<usize>,
        support_vectors: Vec<Arc<SparseVector>>,
        sv_indices: Vec<usize>,
        coefficients: Vec<Vec<f64>>,
        bias: Vec<f64>,
    ) -> Result<Self> {
        config.validate()?;

        let k = labels.len();
        if k < 2 {
            return Err(SVMError::TooFewClasses(k));
        }

        let n_sv = support_vectors.len();
        let shape_error = |what: String| -> Result<Self> { Err(SVMError::InvalidDataset(what)) };

        if sv_count_per_class.len() != k {
            return shape_error(format!(
                "{} support-vector counts for {} classes",
                sv_count_per_class.len(),
                k
            ));
        }
        if sv_count_per_class.iter().sum::<usize>() != n_sv {
            return shape_error(format!(
                "per-class support-vector counts do not add up to {n_sv}"
            ));
        }
        if sv_indices.len() != n_sv {
            return shape_error(format!(
                "{} support-vector indices for {} support vectors",
                sv_indices.len(),
                n_sv
            ));
        }
        if coefficients.len() != k - 1 || coefficients.iter().any(|row| row.len() != n_sv) {
            return shape_error(format!(
                "coefficient table must be {} x {}",
                k - 1,
                n_sv
            ));
        }
        if bias.len() != pair_count(k) {
            return shape_error(format!(
                "{} bias values for {} class pairs",
                bias.len(),
                pair_count(k)
            ));
        }

        Ok(Self {
            kernel: RBFKernel::new(config.gamma),
            config,
            labels,
            sv_count_per_class,
            support_vectors,
            sv_indices,
            coefficients,
            bias,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn sv_count_per_class(&self) -> &[usize] {
        &self.sv_count_per_class
    }

    pub fn support_vectors(&self) -> &[Arc<SparseVector>] {
        &self.support_vectors
    }

    /// 1-based positions of the support vectors in the training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.sv_indices
    }

    /// The `(classes - 1) x n_support_vectors` coefficient table
    pub fn coefficients(&self) -> &[Vec<f64>] {
        &self.coefficients
    }

    /// One bias per class pair, in `pair_index` order
    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Pairwise decision values and per-class votes for `x`
    pub fn decision_values(&self, x: &SparseVector) -> (Vec<f64>, Vec<usize>) {
        let k = self.labels.len();

        // One kernel evaluation per support vector, shared by every pair
        let kernel_values: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| self.kernel.compute(x, sv))
            .collect();

        let start = prefix_offsets(&self.sv_count_per_class);
        let mut votes = vec![0; k];
        let mut decision_values = Vec::with_capacity(pair_count(k));

        for (i, j) in class_pairs(k) {
            let class_i = start[i]..start[i] + self.sv_count_per_class[i];
            let class_j = start[j]..start[j] + self.sv_count_per_class[j];

            let sum_i: f64 = self.coefficients[j - 1][class_i.clone()]
                .iter()
                .zip(&kernel_values[class_i])
                .map(|(a, kv)| a * kv)
                .sum();
            let sum_j: f64 = self.coefficients[i][class_j.clone()]
                .iter()
                .zip(&kernel_values[class_j])
                .map(|(a, kv)| a * kv)
                .sum();

            let value = sum_i + sum_j - self.bias[decision_values.len()];
            decision_values.push(value);

            if value > 0.0 {
                votes[i] += 1;
            } else {
                votes[j] += 1;
            }
        }

        (decision_values, votes)
    }
}

/// Index of the first class holding the most votes
fn winner(votes: &[usize]) -> usize {
    let mut best = 0;
    for (c, &v) in votes.iter().enumerate().skip(1) {
        if v > votes[best] {
            best = c;
        }
    }
    best
}

impl SVMModel for MulticlassModel {
    fn predict(&self, x: &SparseVector) -> Prediction {
        let (decision_values, votes) = self.decision_values(x);
        let label = self.labels[winner(&votes)];
        Prediction::new(label, decision_values, votes)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn n_classes(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config() -> SolverConfig {
        SolverConfig {
            c: 1.0,
            gamma: 1.0,
            epsilon: 0.1,
            max_iterations: None,
        }
    }

    fn sv(x: f64) -> Arc<SparseVector> {
        Arc::new(SparseVector::new(vec![0], vec![x]))
    }

    /// Three classes, one support vector each at x = 0, 10, 20
    fn three_class_model() -> MulticlassModel {
        // row 0: class 0 and class 1 for (0,1), class 2 for (0,2)
        // row 1: class 0 for (0,2), class 1 and class 2 for (1,2)
        let coefficients = vec![vec![1.0, -1.0, -1.0], vec![1.0, 1.0, -1.0]];
        MulticlassModel::from_parts(
            config(),
            vec![4.0, 5.0, 6.0],
            vec![1, 1, 1],
            vec![sv(0.0), sv(10.0), sv(20.0)],
            vec![1, 2, 3],
            coefficients,
            vec![0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_predicts_nearest_class() {
        let model = three_class_model();
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.n_support_vectors(), 3);

        let near_0 = model.predict(&SparseVector::new(vec![0], vec![0.1]));
        assert_eq!(near_0.label, 4.0);
        assert_eq!(near_0.votes, vec![2, 1, 0]);

        let near_1 = model.predict(&SparseVector::new(vec![0], vec![10.0]));
        assert_eq!(near_1.label, 5.0);
        assert_eq!(near_1.votes, vec![0, 2, 1]);

        let near_2 = model.predict(&SparseVector::new(vec![0], vec![19.8]));
        assert_eq!(near_2.label, 6.0);
    }

    #[test]
    fn test_decision_values_follow_pair_order() {
        let model = three_class_model();
        let (values, _) = model.decision_values(&SparseVector::new(vec![0], vec![0.0]));

        assert_eq!(values.len(), 3);
        // pair (0,1): +K(x, sv0) - K(x, sv1)
        assert_relative_eq!(values[0], 1.0 - (-100.0_f64).exp(), epsilon = 1e-12);
        // pair (0,2): +K(x, sv0) - K(x, sv2)
        assert_relative_eq!(values[1], 1.0 - (-400.0_f64).exp(), epsilon = 1e-12);
        // pair (1,2): +K(x, sv1) - K(x, sv2), both vanishing
        assert!(values[2].abs() < 1e-40);
    }

    #[test]
    fn test_bias_is_subtracted() {
        let model = MulticlassModel::from_parts(
            config(),
            vec![1.0, -1.0],
            vec![1, 0],
            vec![sv(0.0)],
            vec![1],
            vec![vec![0.5]],
            vec![0.75],
        )
        .unwrap();

        let p = model.predict(&SparseVector::new(vec![0], vec![0.0]));
        assert_relative_eq!(p.decision_values[0], -0.25, epsilon = 1e-12);
        assert_eq!(p.label, -1.0);
    }

    #[test]
    fn test_tie_goes_to_lowest_class() {
        assert_eq!(winner(&[1, 1, 1]), 0);
        assert_eq!(winner(&[0, 2, 2]), 1);
        assert_eq!(winner(&[0, 1, 2]), 2);
    }

    #[test]
    fn test_prediction_is_deterministic() {
        let model = three_class_model();
        let x = SparseVector::new(vec![0], vec![7.3]);
        let first = model.predict(&x);
        for _ in 0..5 {
            assert_eq!(model.predict(&x), first);
        }
    }

    #[test]
    fn test_from_parts_rejects_bad_shapes() {
        let too_few = MulticlassModel::from_parts(
            config(),
            vec![1.0],
            vec![1],
            vec![sv(0.0)],
            vec![1],
            vec![],
            vec![],
        );
        assert!(matches!(too_few, Err(SVMError::TooFewClasses(1))));

        let wrong_bias = MulticlassModel::from_parts(
            config(),
            vec![1.0, 2.0],
            vec![1, 0],
            vec![sv(0.0)],
            vec![1],
            vec![vec![1.0]],
            vec![0.0, 0.0],
        );
        assert!(matches!(wrong_bias, Err(SVMError::InvalidDataset(_))));

        let wrong_rows = MulticlassModel::from_parts(
            config(),
            vec![1.0, 2.0],
            vec![1, 0],
            vec![sv(0.0)],
            vec![1],
            vec![vec![1.0, 2.0]],
            vec![0.0],
        );
        assert!(matches!(wrong_rows, Err(SVMError::InvalidDataset(_))));
    }
}
