//! High-level API for Support Vector Machine operations
//!
//! This module provides a user-friendly interface for common SVM tasks,
//! including training, prediction, cross-validation and model evaluation.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pegasvm::api::SVM;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Train a model on data
//! let svm = SVM::new()
//!     .with_c(1.0)
//!     .with_gamma(0.5)
//!     .train_from_file("data.libsvm")?;
//!
//! // Make predictions
//! let predictions = svm.predict_from_file("test.libsvm")?;
//! println!("Accuracy: {:.2}%", svm.evaluate_from_file("test.libsvm")?.accuracy());
//! # Ok(())
//! # }
//! ```

use crate::core::{Dataset, Prediction, Result, SVMModel, Sample, SolverConfig, SparseVector};
use crate::data::LibSVMDataset;
use crate::multiclass::{MulticlassModel, MulticlassTrainer};
use crate::persistence::SerializableModel;
use crate::validation::{CrossValidationReport, CrossValidator, DEFAULT_SEED};
use std::path::Path;

/// High-level SVM interface with builder pattern
#[derive(Debug, Clone)]
pub struct SVM {
    config: SolverConfig,
    seed: u64,
}

impl SVM {
    /// Create a new SVM with default parameters
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
            seed: DEFAULT_SEED,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set RBF kernel width
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.config.gamma = gamma;
        self
    }

    /// Set the stopping scale (target margin is `epsilon * C`)
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Cap solver iterations per class pair
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    /// Seed for cross-validation shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train on a dataset
    pub fn train<D: Dataset>(self, dataset: &D) -> Result<TrainedModel> {
        self.train_samples(dataset.samples())
    }

    /// Train on samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel> {
        let model = MulticlassTrainer::new(self.config)?.train(samples)?;
        Ok(TrainedModel { model })
    }

    /// Train from LibSVM format file
    pub fn train_from_file<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.train(&dataset)
    }

    /// Stratified k-fold cross-validation on a dataset
    pub fn cross_validate<D: Dataset>(
        &self,
        dataset: &D,
        num_folds: usize,
    ) -> Result<CrossValidationReport> {
        CrossValidator::new(self.config.clone(), num_folds)?
            .with_seed(self.seed)
            .run(dataset.samples())
    }

    /// Stratified k-fold cross-validation on a LibSVM file
    pub fn cross_validate_file<P: AsRef<Path>>(
        &self,
        path: P,
        num_folds: usize,
    ) -> Result<CrossValidationReport> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.cross_validate(&dataset, num_folds)
    }
}

impl Default for SVM {
    fn default() -> Self {
        Self::new()
    }
}

/// Trained SVM model with high-level prediction interface
#[derive(Debug, Clone)]
pub struct TrainedModel {
    model: MulticlassModel,
}

impl TrainedModel {
    /// Wrap an existing model
    pub fn from_model(model: MulticlassModel) -> Self {
        Self { model }
    }

    /// Load a model saved with [`TrainedModel::save`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let model = SerializableModel::load_from_file(path)?.to_model()?;
        Ok(Self { model })
    }

    /// Save the model as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        SerializableModel::from_model(&self.model).save_to_file(path)
    }

    /// Predict a single feature vector
    pub fn predict(&self, x: &SparseVector) -> Prediction {
        self.model.predict(x)
    }

    /// Predict multiple samples
    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        self.model.predict_batch(samples)
    }

    /// Predict from dataset
    pub fn predict_dataset<D: Dataset>(&self, dataset: &D) -> Vec<Prediction> {
        self.predict_batch(dataset.samples())
    }

    /// Predict from LibSVM file
    pub fn predict_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Prediction>> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(self.predict_dataset(&dataset))
    }

    /// Evaluate a dataset against its labels
    pub fn evaluate<D: Dataset>(&self, dataset: &D) -> EvaluationMetrics {
        let predictions = self.predict_dataset(dataset);
        let labels = dataset.get_labels();
        EvaluationMetrics::from_predictions(self.model.labels(), &predictions, &labels)
    }

    /// Evaluate from LibSVM file
    pub fn evaluate_from_file<P: AsRef<Path>>(&self, path: P) -> Result<EvaluationMetrics> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(self.evaluate(&dataset))
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_classes: self.model.n_classes(),
            labels: self.model.labels().to_vec(),
            n_support_vectors: self.model.n_support_vectors(),
            sv_count_per_class: self.model.sv_count_per_class().to_vec(),
            bias: self.model.bias().to_vec(),
            support_vector_indices: self.model.support_vector_indices().to_vec(),
        }
    }

    /// Get the underlying trained model
    pub fn inner(&self) -> &MulticlassModel {
        &self.model
    }
}

/// Prediction quality against known labels
#[derive(Debug, Clone)]
pub struct EvaluationMetrics {
    /// Class labels, indexing both axes of `confusion`
    pub labels: Vec<f64>,
    /// `confusion[actual][predicted]` over samples whose label the model knows
    pub confusion: Vec<Vec<usize>>,
    /// Samples whose true label the model never saw (always misclassified)
    pub unknown_labels: usize,
    pub correct: usize,
    pub total: usize,
}

impl EvaluationMetrics {
    fn from_predictions(labels: &[f64], predictions: &[Prediction], actual: &[f64]) -> Self {
        let k = labels.len();
        let class_of = |label: f64| labels.iter().position(|&l| l == label);

        let mut confusion = vec![vec![0; k]; k];
        let mut unknown_labels = 0;
        let mut correct = 0;

        for (pred, &truth) in predictions.iter().zip(actual) {
            if pred.label == truth {
                correct += 1;
            }
            match (class_of(truth), class_of(pred.label)) {
                (Some(t), Some(p)) => confusion[t][p] += 1,
                _ => unknown_labels += 1,
            }
        }

        Self {
            labels: labels.to_vec(),
            confusion,
            unknown_labels,
            correct,
            total: actual.len(),
        }
    }

    /// Accuracy in percent
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.correct as f64 / self.total as f64
        }
    }
}

/// Model information
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub n_classes: usize,
    pub labels: Vec<f64>,
    pub n_support_vectors: usize,
    pub sv_count_per_class: Vec<usize>,
    pub bias: Vec<f64>,
    pub support_vector_indices: Vec<usize>,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train on LibSVM data with default parameters
    pub fn train_libsvm<P: AsRef<Path>>(path: P) -> Result<TrainedModel> {
        SVM::new().train_from_file(path)
    }

    /// Train on one file, report accuracy (percent) on another
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
        config: SolverConfig,
    ) -> Result<f64> {
        let svm = SVM {
            config,
            seed: DEFAULT_SEED,
        };
        let model = svm.train_from_file(train_path)?;
        Ok(model.evaluate_from_file(test_path)?.accuracy())
    }

    /// Cross-validated accuracy (percent) of a LibSVM file
    pub fn cross_validate_libsvm<P: AsRef<Path>>(
        path: P,
        config: SolverConfig,
        num_folds: usize,
    ) -> Result<f64> {
        let svm = SVM {
            config,
            seed: DEFAULT_SEED,
        };
        Ok(svm.cross_validate_file(path, num_folds)?.accuracy())
    }
}
