//! Core type definitions for SVM

use crate::core::{Result, SVMError};
use std::sync::Arc;

/// Index value that terminates a node array
pub const SENTINEL_INDEX: i32 = -1;

/// A single `(index, value)` pair in node-array form
///
/// Node arrays end with a node whose index is [`SENTINEL_INDEX`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureNode {
    pub index: i32,
    pub value: f64,
}

impl FeatureNode {
    pub fn new(index: i32, value: f64) -> Self {
        Self { index, value }
    }

    /// The terminating node
    pub fn sentinel() -> Self {
        Self {
            index: SENTINEL_INDEX,
            value: 0.0,
        }
    }
}

/// Result of a prediction: the winning label plus every pairwise decision value
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: f64,
    /// One decision value per class pair, in `pair_index` order
    pub decision_values: Vec<f64>,
    /// Votes collected by each class, in model class order
    pub votes: Vec<usize>,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_values: Vec<f64>, votes: Vec<usize>) -> Self {
        Self {
            label,
            decision_values,
            votes,
        }
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    ///
    /// # Panics
    /// Panics if the lengths differ or an index appears twice. Use
    /// [`SparseVector::try_new`] for untrusted input.
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );
        match Self::try_new(indices, values) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    /// Sort `(index, value)` pairs into a vector, rejecting repeated indices
    pub fn try_new(indices: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(SVMError::InvalidDataset(format!(
                "{} indices but {} values",
                indices.len(),
                values.len()
            )));
        }

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        if let Some(w) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(SVMError::DuplicateIndex(w[0].0));
        }

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Ok(Self { indices, values })
    }

    /// Build a vector from a dense slice, keeping every position
    pub fn from_dense(values: &[f64]) -> Self {
        Self {
            indices: (0..values.len()).collect(),
            values: values.to_vec(),
        }
    }

    /// Build a vector from a sentinel-terminated node array
    ///
    /// Every node before the sentinel must carry a non-negative index, and
    /// indices must be strictly increasing. Nothing after the sentinel is read.
    pub fn from_nodes(nodes: &[FeatureNode]) -> Result<Self> {
        let end = nodes
            .iter()
            .position(|node| node.index == SENTINEL_INDEX)
            .ok_or(SVMError::MissingSentinel)?;

        let mut indices = Vec::with_capacity(end);
        let mut values = Vec::with_capacity(end);

        for (position, node) in nodes[..end].iter().enumerate() {
            if node.index < 0 {
                return Err(SVMError::UnsortedIndices { position });
            }
            let index = node.index as usize;
            if indices.last().is_some_and(|&prev| prev >= index) {
                return Err(SVMError::UnsortedIndices { position });
            }
            indices.push(index);
            values.push(node.value);
        }

        Ok(Self { indices, values })
    }

    /// Node-array form of this vector, including the trailing sentinel
    pub fn to_nodes(&self) -> Vec<FeatureNode> {
        self.indices
            .iter()
            .zip(&self.values)
            .map(|(&index, &value)| FeatureNode::new(index as i32, value))
            .chain(std::iter::once(FeatureNode::sentinel()))
            .collect()
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Training sample with features and label
///
/// Features sit behind an `Arc` so that sub-problems and trained models can
/// refer to the same storage without copying feature data.
#[derive(Clone, Debug)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: Arc<SparseVector>,
    /// Class label (an integral class id)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self {
            features: Arc::new(features),
            label,
        }
    }
}

/// Output of one binary solve
#[derive(Debug, Clone)]
pub struct DecisionFunction {
    /// Dual coefficients, one per sample of the sub-problem
    pub alpha: Vec<f64>,
    /// Bias term
    pub bias: f64,
    /// Margin `y * output` of the last worst violator
    pub objective: f64,
    /// Number of iterations performed
    pub iterations: usize,
}

impl DecisionFunction {
    /// All-zero solution for a problem of size `n`
    pub fn zeros(n: usize) -> Self {
        Self {
            alpha: vec![0.0; n],
            bias: 0.0,
            objective: 0.0,
            iterations: 0,
        }
    }

    /// Number of samples with a non-zero coefficient
    pub fn n_support_vectors(&self) -> usize {
        self.alpha.iter().filter(|a| a.abs() > 0.0).count()
    }
}

/// Hyperparameters shared by the solver, the trainer and cross-validation
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Regularization parameter
    pub c: f64,
    /// RBF kernel width
    pub gamma: f64,
    /// Stopping scale: the solver stops once the worst margin reaches `epsilon * c`
    pub epsilon: f64,
    /// Optional cap on solver iterations
    pub max_iterations: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: 1.0,
            epsilon: 0.001,
            max_iterations: None,
        }
    }
}

impl SolverConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "C must be positive and finite, got: {}",
                self.c
            )));
        }
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(SVMError::InvalidParameter(format!(
                "gamma must be positive and finite, got: {}",
                self.gamma
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon < 1.0) {
            return Err(SVMError::InvalidParameter(format!(
                "epsilon must lie in (0, 1), got: {}",
                self.epsilon
            )));
        }
        if self.max_iterations == Some(0) {
            return Err(SVMError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Margin the worst violator has to reach before the solver stops
    pub fn margin_target(&self) -> f64 {
        self.epsilon * self.c
    }
}
