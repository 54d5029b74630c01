//! Stratified k-fold cross-validation
//!
//! Samples are grouped by class and shuffled inside each class. Every class
//! is then cut into `k` near-equal slices, and slice `f` of every class goes
//! to fold `f`, so each fold keeps the class proportions of the whole set.

use crate::core::{Result, SVMError, SVMModel, Sample, SolverConfig};
use crate::multiclass::{group_classes, ClassGroups, MulticlassTrainer};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 1;

/// Disjoint folds covering every sample exactly once
#[derive(Debug, Clone, PartialEq)]
pub struct FoldPartition {
    /// Sample indices ordered fold by fold
    pub perm: Vec<usize>,
    /// Offset of each fold in `perm`, plus a final end offset
    pub fold_start: Vec<usize>,
}

impl FoldPartition {
    pub fn num_folds(&self) -> usize {
        self.fold_start.len() - 1
    }

    /// Samples held out in fold `f`
    pub fn fold(&self, f: usize) -> &[usize] {
        &self.perm[self.fold_start[f]..self.fold_start[f + 1]]
    }

    /// Samples used for training while fold `f` is held out
    pub fn training(&self, f: usize) -> impl Iterator<Item = usize> + '_ {
        self.perm[..self.fold_start[f]]
            .iter()
            .chain(&self.perm[self.fold_start[f + 1]..])
            .copied()
    }
}

/// Size of slice `f` when `count` items are split into `num_folds` slices
fn slice_bounds(count: usize, f: usize, num_folds: usize) -> (usize, usize) {
    (f * count / num_folds, (f + 1) * count / num_folds)
}

/// Build stratified folds from grouped samples
///
/// Within each class run the order is shuffled with Fisher-Yates before it
/// is sliced, so the assignment depends only on `rng`.
pub fn stratified_folds<R: Rng>(
    groups: &ClassGroups,
    num_folds: usize,
    rng: &mut R,
) -> FoldPartition {
    let mut index = groups.perm.clone();
    for c in 0..groups.num_classes() {
        let class = &mut index[groups.range(c)];
        let n = class.len();
        for i in 0..n {
            let j = rng.gen_range(i..n);
            class.swap(i, j);
        }
    }

    let fold_count: Vec<usize> = (0..num_folds)
        .map(|f| {
            groups
                .count
                .iter()
                .map(|&count| {
                    let (begin, end) = slice_bounds(count, f, num_folds);
                    end - begin
                })
                .sum()
        })
        .collect();

    let mut fold_start = Vec::with_capacity(num_folds + 1);
    fold_start.push(0);
    for f in 0..num_folds {
        fold_start.push(fold_start[f] + fold_count[f]);
    }

    let mut perm = vec![0; index.len()];
    let mut next = fold_start.clone();
    for c in 0..groups.num_classes() {
        for f in 0..num_folds {
            let (begin, end) = slice_bounds(groups.count[c], f, num_folds);
            let slice = &index[groups.start[c] + begin..groups.start[c] + end];
            perm[next[f]..next[f] + slice.len()].copy_from_slice(slice);
            next[f] += slice.len();
        }
    }

    FoldPartition { perm, fold_start }
}

/// Out-of-fold predictions and the resulting accuracy
#[derive(Debug, Clone)]
pub struct CrossValidationReport {
    /// Prediction for each sample, made by the model that did not see it
    pub predictions: Vec<f64>,
    pub correct: usize,
    pub total: usize,
}

impl CrossValidationReport {
    /// Accuracy in percent
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.total as f64
        }
    }
}

/// Runs stratified k-fold cross-validation
pub struct CrossValidator {
    trainer: MulticlassTrainer,
    num_folds: usize,
    seed: u64,
}

impl CrossValidator {
    pub fn new(config: SolverConfig, num_folds: usize) -> Result<Self> {
        if num_folds < 2 {
            return Err(SVMError::InvalidParameter(format!(
                "Cross-validation needs at least 2 folds, got: {num_folds}"
            )));
        }
        Ok(Self {
            trainer: MulticlassTrainer::new(config)?,
            num_folds,
            seed: DEFAULT_SEED,
        })
    }

    /// Seed for the per-class shuffle
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_folds(&self) -> usize {
        self.num_folds
    }

    /// Fold assignment this validator would use for `samples`
    pub fn partition(&self, samples: &[Sample]) -> Result<FoldPartition> {
        if self.num_folds > samples.len() {
            return Err(SVMError::InvalidParameter(format!(
                "{} folds requested for {} samples",
                self.num_folds,
                samples.len()
            )));
        }

        let labels: Vec<f64> = samples.iter().map(|s| s.label).collect();
        let groups = group_classes(&labels)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        Ok(stratified_folds(&groups, self.num_folds, &mut rng))
    }

    /// Train on all folds but one, predict the held-out fold, repeat
    pub fn run(&self, samples: &[Sample]) -> Result<CrossValidationReport> {
        let partition = self.partition(samples)?;
        let mut predictions = vec![0.0; samples.len()];

        for f in 0..self.num_folds {
            let training: Vec<&Sample> = partition.training(f).map(|i| &samples[i]).collect();
            let model = self.trainer.train_refs(&training)?;

            for &i in partition.fold(f) {
                predictions[i] = model.predict(&samples[i].features).label;
            }

            info!(
                "fold {}/{}: trained on {}, held out {}",
                f + 1,
                self.num_folds,
                training.len(),
                partition.fold(f).len()
            );
        }

        let correct = predictions
            .iter()
            .zip(samples)
            .filter(|(&p, s)| p == s.label)
            .count();

        let report = CrossValidationReport {
            predictions,
            correct,
            total: samples.len(),
        };
        info!(
            "cross-validation accuracy = {:.4}% ({}/{})",
            report.accuracy(),
            report.correct,
            report.total
        );
        Ok(report)
    }
}

/// Cross-validated accuracy in percent
pub fn cross_validate(
    samples: &[Sample],
    config: SolverConfig,
    num_folds: usize,
    seed: u64,
) -> Result<f64> {
    let report = CrossValidator::new(config, num_folds)?
        .with_seed(seed)
        .run(samples)?;
    Ok(report.accuracy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    fn config() -> SolverConfig {
        SolverConfig {
            c: 1.0,
            gamma: 0.5,
            epsilon: 0.1,
            max_iterations: None,
        }
    }

    fn two_clusters(per_class: usize) -> Vec<Sample> {
        (0..per_class)
            .flat_map(|i| {
                let d = i as f64 * 0.01;
                [
                    Sample::new(SparseVector::from_dense(&[d, d]), -1.0),
                    Sample::new(SparseVector::from_dense(&[10.0 + d, 10.0 - d]), 1.0),
                ]
            })
            .collect()
    }

    fn sorted(mut v: Vec<usize>) -> Vec<usize> {
        v.sort_unstable();
        v
    }

    #[test]
    fn test_five_folds_of_four() {
        let samples = two_clusters(10);
        let validator = CrossValidator::new(config(), 5).unwrap();
        let partition = validator.partition(&samples).unwrap();

        assert_eq!(partition.num_folds(), 5);
        for f in 0..5 {
            let fold = partition.fold(f);
            assert_eq!(fold.len(), 4);

            // two of each class
            let positives = fold.iter().filter(|&&i| samples[i].label > 0.0).count();
            assert_eq!(positives, 2);

            assert_eq!(partition.training(f).count(), 16);
        }
        assert_eq!(sorted(partition.perm.clone()), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_folds_are_exhaustive_for_every_fold_count() {
        let labels: Vec<f64> = (0..13).map(|i| (i % 3) as f64).collect();
        let groups = group_classes(&labels).unwrap();

        for k in 2..=labels.len() {
            let mut rng = StdRng::seed_from_u64(k as u64);
            let partition = stratified_folds(&groups, k, &mut rng);

            let held_out: Vec<usize> = (0..k).flat_map(|f| partition.fold(f).to_vec()).collect();
            assert_eq!(sorted(held_out), (0..labels.len()).collect::<Vec<_>>());

            let sizes: Vec<usize> = (0..k).map(|f| partition.fold(f).len()).collect();
            let spread = sizes.iter().max().unwrap() - sizes.iter().min().unwrap();
            assert!(spread <= groups.num_classes(), "fold sizes {sizes:?}");
        }
    }

    #[test]
    fn test_same_seed_same_partition() {
        let samples = two_clusters(8);
        let a = CrossValidator::new(config(), 4)
            .unwrap()
            .with_seed(42)
            .partition(&samples)
            .unwrap();
        let b = CrossValidator::new(config(), 4)
            .unwrap()
            .with_seed(42)
            .partition(&samples)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_separable_accuracy() {
        let samples = two_clusters(10);
        let report = CrossValidator::new(config(), 5)
            .unwrap()
            .run(&samples)
            .unwrap();

        assert_eq!(report.total, 20);
        assert_eq!(report.predictions.len(), 20);
        assert!(report.accuracy() >= 90.0, "accuracy {}", report.accuracy());
        assert!((0.0..=100.0).contains(&report.accuracy()));
    }

    #[test]
    fn test_rejects_bad_fold_counts() {
        assert!(matches!(
            CrossValidator::new(config(), 1),
            Err(SVMError::InvalidParameter(_))
        ));

        let samples = two_clusters(2);
        let validator = CrossValidator::new(config(), 5).unwrap();
        assert!(matches!(
            validator.run(&samples),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fold_without_second_class_is_reported() {
        let mut samples: Vec<Sample> = (0..3)
            .map(|i| Sample::new(SparseVector::from_dense(&[i as f64]), 1.0))
            .collect();
        samples.push(Sample::new(SparseVector::from_dense(&[9.0]), 2.0));

        let result = cross_validate(&samples, config(), 2, DEFAULT_SEED);
        assert!(matches!(result, Err(SVMError::TooFewClasses(1))));
    }

    #[test]
    fn test_report_accuracy() {
        let report = CrossValidationReport {
            predictions: vec![1.0, 2.0, 2.0, 1.0],
            correct: 3,
            total: 4,
        };
        assert_eq!(report.accuracy(), 75.0);
    }
}
