//! Core traits for SVM implementation

use crate::core::{Prediction, Sample, SparseVector};

/// Dataset abstraction for efficient data access
pub trait Dataset {
    /// All samples, in file order
    fn samples(&self) -> &[Sample];

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Number of samples in the dataset
    fn len(&self) -> usize {
        self.samples().len()
    }

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> &Sample {
        &self.samples()[i]
    }

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<f64> {
        self.samples().iter().map(|s| s.label).collect()
    }

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trained SVM model
pub trait SVMModel {
    /// Predict a single feature vector
    fn predict(&self, x: &SparseVector) -> Prediction;

    /// Predict multiple samples
    fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        samples.iter().map(|s| self.predict(&s.features)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the number of classes
    fn n_classes(&self) -> usize;
}
