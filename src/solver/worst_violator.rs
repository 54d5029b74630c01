//! Worst-violator sub-gradient solver for binary SVM
//!
//! A Pegasos-style online solver: every iteration takes the sample with the
//! smallest margin `y * output`, pushes its coefficient along its label with a
//! `2 / sqrt(t)` learning rate, and retires it from the active set. Outputs of
//! the remaining samples are updated incrementally, so an iteration costs one
//! kernel evaluation per active sample.

use crate::core::{DecisionFunction, Result, SVMError, SolverConfig, SparseVector};
use crate::kernel::Kernel;
use log::debug;
use std::sync::Arc;

/// Two-class training problem with labels in {+1, -1}
///
/// Feature vectors are borrowed from the owning training set.
#[derive(Debug, Clone, Default)]
pub struct BinaryProblem<'a> {
    pub features: Vec<&'a SparseVector>,
    pub labels: Vec<f64>,
}

impl<'a> BinaryProblem<'a> {
    pub fn new(features: Vec<&'a SparseVector>, labels: Vec<f64>) -> Self {
        Self { features, labels }
    }

    /// Create an empty problem with room for `capacity` samples
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            features: Vec::with_capacity(capacity),
            labels: Vec::with_capacity(capacity),
        }
    }

    /// Append one sample
    pub fn push(&mut self, features: &'a SparseVector, label: f64) {
        self.features.push(features);
        self.labels.push(label);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(SVMError::EmptyProblem);
        }
        if self.features.len() != self.labels.len() {
            return Err(SVMError::InvalidDataset(format!(
                "{} feature vectors but {} labels",
                self.features.len(),
                self.labels.len()
            )));
        }
        if let Some(&label) = self.labels.iter().find(|&&y| y != 1.0 && y != -1.0) {
            return Err(SVMError::InvalidLabel(label));
        }
        Ok(())
    }
}

/// Binary solver driven by the current worst margin violator
pub struct WorstViolatorSolver<K: Kernel> {
    kernel: Arc<K>,
    config: SolverConfig,
}

impl<K: Kernel> WorstViolatorSolver<K> {
    /// Create a new solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: SolverConfig) -> Self {
        Self { kernel, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train one binary classifier
    ///
    /// Stops when the worst margin reaches `epsilon * C`, when every sample
    /// has been retired, or when the optional iteration cap is hit. None of
    /// these is an error; the reported objective is the last worst margin.
    pub fn solve(&self, problem: &BinaryProblem<'_>) -> Result<DecisionFunction> {
        self.config.validate()?;
        problem.validate()?;

        let n = problem.len();
        let mut solution = DecisionFunction::zeros(n);

        // A lone sample defines the margin on its own
        if n == 1 {
            debug!("single-sample problem, nothing to optimize");
            return Ok(solution);
        }

        let c = self.config.c;
        let target = self.config.margin_target();
        let max_iterations = self.config.max_iterations.unwrap_or(usize::MAX);
        let labels = &problem.labels;
        let features = &problem.features;

        let mut output = vec![0.0; n];
        let mut active: Vec<usize> = (0..n).collect();

        // (position in `active`, sample index) of the worst violator
        let mut worst_pos = 0;
        let mut worst = active[worst_pos];
        let mut margin = labels[worst] * output[worst];

        while margin < target && solution.iterations < max_iterations {
            solution.iterations += 1;
            let learning_rate = 2.0 / (solution.iterations as f64).sqrt();

            active.remove(worst_pos);

            let step = learning_rate * c * labels[worst];
            let bias_step = step / n as f64;
            solution.alpha[worst] += step;
            solution.bias += bias_step;

            if active.is_empty() {
                break;
            }

            let retired = features[worst];
            let mut next_pos = 0;
            let mut next_margin = f64::INFINITY;

            for (pos, &i) in active.iter().enumerate() {
                output[i] += step * self.kernel.compute(features[i], retired) + bias_step;

                let m = labels[i] * output[i];
                if m < next_margin {
                    next_margin = m;
                    next_pos = pos;
                }
            }

            worst_pos = next_pos;
            worst = active[worst_pos];
            margin = next_margin;
        }

        solution.objective = margin;

        debug!(
            "binary solve: n={} iterations={} obj={:.6} bias={:.6} nSV={}",
            n,
            solution.iterations,
            solution.objective,
            solution.bias,
            solution.n_support_vectors()
        );

        Ok(solution)
    }
}
