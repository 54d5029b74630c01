//! One-vs-one training: one binary solve per class pair, assembled into a
//! single [`MulticlassModel`]

use crate::core::{DecisionFunction, Result, SVMError, Sample, SolverConfig};
use crate::kernel::RBFKernel;
use crate::multiclass::grouping::{class_pairs, group_classes, pair_count, prefix_offsets};
use crate::multiclass::model::MulticlassModel;
use crate::solver::{BinaryProblem, WorstViolatorSolver};
use log::info;
use std::sync::Arc;

/// Trains multi-class models with the worst-violator solver
pub struct MulticlassTrainer {
    kernel: Arc<RBFKernel>,
    config: SolverConfig,
}

impl MulticlassTrainer {
    /// Create a trainer, rejecting invalid hyperparameters up front
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            kernel: Arc::new(RBFKernel::new(config.gamma)),
            config,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train on an owned slice of samples
    pub fn train(&self, samples: &[Sample]) -> Result<MulticlassModel> {
        let refs: Vec<&Sample> = samples.iter().collect();
        self.train_refs(&refs)
    }

    /// Train on borrowed samples
    ///
    /// Feature vectors are never copied: sub-problems borrow them and the
    /// model shares the support vectors' storage.
    pub fn train_refs(&self, samples: &[&Sample]) -> Result<MulticlassModel> {
        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
        let groups = group_classes(&labels)?;
        let k = groups.num_classes();
        if k < 2 {
            return Err(SVMError::TooFewClasses(k));
        }

        let l = samples.len();
        let grouped: Vec<&Sample> = groups.perm.iter().map(|&i| samples[i]).collect();
        let solver = WorstViolatorSolver::new(Arc::clone(&self.kernel), self.config.clone());

        let mut nonzero = vec![false; l];
        let mut functions: Vec<DecisionFunction> = Vec::with_capacity(pair_count(k));

        for (i, j) in class_pairs(k) {
            let (si, ci) = (groups.start[i], groups.count[i]);
            let (sj, cj) = (groups.start[j], groups.count[j]);

            let mut sub = BinaryProblem::with_capacity(ci + cj);
            for s in &grouped[si..si + ci] {
                sub.push(&s.features, 1.0);
            }
            for s in &grouped[sj..sj + cj] {
                sub.push(&s.features, -1.0);
            }

            let f = solver.solve(&sub)?;

            for (flag, a) in nonzero[si..si + ci].iter_mut().zip(&f.alpha[..ci]) {
                *flag |= a.abs() > 0.0;
            }
            for (flag, a) in nonzero[sj..sj + cj].iter_mut().zip(&f.alpha[ci..]) {
                *flag |= a.abs() > 0.0;
            }

            functions.push(f);
        }

        let sv_count_per_class: Vec<usize> = (0..k)
            .map(|c| nonzero[groups.range(c)].iter().filter(|&&nz| nz).count())
            .collect();
        let total_sv: usize = sv_count_per_class.iter().sum();
        info!("trained {} classifiers, total nSV = {}", functions.len(), total_sv);

        let mut support_vectors = Vec::with_capacity(total_sv);
        let mut sv_indices = Vec::with_capacity(total_sv);
        for p in (0..l).filter(|&p| nonzero[p]) {
            support_vectors.push(Arc::clone(&grouped[p].features));
            sv_indices.push(groups.perm[p] + 1);
        }

        let mut coefficients = Vec::with_capacity(k - 1);
        for _ in 0..k - 1 {
            coefficients.push(zeroed(total_sv)?);
        }

        let nz_start = prefix_offsets(&sv_count_per_class);
        for ((i, j), f) in class_pairs(k).zip(&functions) {
            let ci = groups.count[i];

            // class i lands in row j - 1, class j in row i
            scatter(
                &mut coefficients[j - 1][nz_start[i]..],
                &f.alpha[..ci],
                &nonzero[groups.range(i)],
            );
            scatter(
                &mut coefficients[i][nz_start[j]..],
                &f.alpha[ci..],
                &nonzero[groups.range(j)],
            );
        }

        let bias = functions.iter().map(|f| f.bias).collect();

        MulticlassModel::from_parts(
            self.config.clone(),
            groups.labels,
            sv_count_per_class,
            support_vectors,
            sv_indices,
            coefficients,
            bias,
        )
    }
}

/// Copy the coefficients of flagged samples, in order, to the front of `row`
fn scatter(row: &mut [f64], alpha: &[f64], flags: &[bool]) {
    let kept = alpha
        .iter()
        .zip(flags)
        .filter_map(|(&a, &nz)| nz.then_some(a));
    for (slot, a) in row.iter_mut().zip(kept) {
        *slot = a;
    }
}

/// Zero-filled buffer whose allocation failure is reported instead of aborting
fn zeroed(len: usize) -> Result<Vec<f64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        SVMError::ResourceExhausted(format!("coefficient row of {len} entries: {e}"))
    })?;
    buf.resize(len, 0.0);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SVMModel, SparseVector};

    fn config() -> SolverConfig {
        SolverConfig {
            c: 1.0,
            gamma: 0.5,
            epsilon: 0.1,
            max_iterations: None,
        }
    }

    fn sample(x: f64, y: f64, label: f64) -> Sample {
        Sample::new(SparseVector::from_dense(&[x, y]), label)
    }

    fn three_clusters() -> Vec<Sample> {
        let mut samples = Vec::new();
        for (cx, cy, label) in [(0.0, 0.0, 7.0), (5.0, 0.0, 3.0), (0.0, 5.0, 9.0)] {
            for d in [0.0, 0.05, 0.1] {
                samples.push(sample(cx + d, cy - d, label));
            }
        }
        samples
    }

    #[test]
    fn test_rejects_single_class() {
        let trainer = MulticlassTrainer::new(config()).unwrap();
        let samples = vec![sample(0.0, 0.0, 1.0), sample(1.0, 1.0, 1.0)];
        assert!(matches!(
            trainer.train(&samples),
            Err(SVMError::TooFewClasses(1))
        ));
    }

    #[test]
    fn test_rejects_empty_input() {
        let trainer = MulticlassTrainer::new(config()).unwrap();
        assert!(matches!(trainer.train(&[]), Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = SolverConfig {
            gamma: 0.0,
            ..config()
        };
        assert!(matches!(
            MulticlassTrainer::new(bad),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_three_class_model_shape() {
        let trainer = MulticlassTrainer::new(config()).unwrap();
        let samples = three_clusters();
        let model = trainer.train(&samples).unwrap();

        assert_eq!(model.labels(), &[7.0, 3.0, 9.0]);
        assert_eq!(model.bias().len(), 3);
        assert_eq!(model.coefficients().len(), 2);
        for row in model.coefficients() {
            assert_eq!(row.len(), model.n_support_vectors());
        }
        assert_eq!(
            model.sv_count_per_class().iter().sum::<usize>(),
            model.n_support_vectors()
        );

        // Support vector indices are 1-based and point back at the same storage
        for (sv, &idx) in model
            .support_vectors()
            .iter()
            .zip(model.support_vector_indices())
        {
            assert!(idx >= 1 && idx <= samples.len());
            assert!(Arc::ptr_eq(sv, &samples[idx - 1].features));
        }
    }

    #[test]
    fn test_three_class_training_accuracy() {
        let trainer = MulticlassTrainer::new(config()).unwrap();
        let samples = three_clusters();
        let model = trainer.train(&samples).unwrap();

        for s in &samples {
            assert_eq!(model.predict(&s.features).label, s.label);
        }
    }

    #[test]
    fn test_binary_model_puts_positive_class_first() {
        let trainer = MulticlassTrainer::new(config()).unwrap();
        let samples = vec![
            sample(0.0, 0.0, -1.0),
            sample(10.0, 10.0, 1.0),
            sample(0.1, 0.0, -1.0),
            sample(10.1, 10.0, 1.0),
        ];
        let model = trainer.train(&samples).unwrap();
        assert_eq!(model.labels(), &[1.0, -1.0]);

        let p = model.predict(&SparseVector::from_dense(&[10.0, 10.1]));
        assert!(p.decision_values[0] > 0.0);
        assert_eq!(p.label, 1.0);
    }

    #[test]
    fn test_coefficient_table_matches_pairwise_solves() {
        use crate::multiclass::grouping::pair_index;

        let samples = three_clusters();
        let model = MulticlassTrainer::new(config())
            .unwrap()
            .train(&samples)
            .unwrap();

        let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
        let groups = group_classes(&labels).unwrap();
        let k = groups.num_classes();
        let solver = WorstViolatorSolver::new(Arc::new(RBFKernel::new(config().gamma)), config());
        let nz_start = prefix_offsets(model.sv_count_per_class());
        let is_sv = |p: usize| {
            model
                .support_vector_indices()
                .contains(&(groups.perm[p] + 1))
        };

        for (i, j) in class_pairs(k) {
            let mut sub = BinaryProblem::default();
            for &idx in groups.members(i) {
                sub.push(&samples[idx].features, 1.0);
            }
            for &idx in groups.members(j) {
                sub.push(&samples[idx].features, -1.0);
            }
            let f = solver.solve(&sub).unwrap();
            let ci = groups.count[i];

            // Class i sits in row j - 1, class j in row i
            for (class, row, alpha) in [(i, j - 1, &f.alpha[..ci]), (j, i, &f.alpha[ci..])] {
                let kept: Vec<f64> = groups
                    .range(class)
                    .zip(alpha)
                    .filter(|(p, _)| is_sv(*p))
                    .map(|(_, &a)| a)
                    .collect();
                assert_eq!(kept.len(), model.sv_count_per_class()[class]);

                let start = nz_start[class];
                assert_eq!(
                    &model.coefficients()[row][start..start + kept.len()],
                    kept.as_slice(),
                    "pair ({i}, {j}), class {class}"
                );
            }

            assert_eq!(model.bias()[pair_index(i, j, k)], f.bias);
        }
    }

    #[test]
    fn test_scatter_keeps_flagged_entries_in_order() {
        let mut row = vec![0.0; 4];
        scatter(&mut row[1..], &[1.0, 2.0, 3.0], &[true, false, true]);
        assert_eq!(row, vec![0.0, 1.0, 3.0, 0.0]);
    }
}
