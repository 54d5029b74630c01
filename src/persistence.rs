//! Model serialization and persistence
//!
//! Trained models are stored as JSON. Loading rebuilds a
//! [`MulticlassModel`] that predicts exactly like the one that was saved.

use crate::core::{Result, SVMError, SolverConfig, SparseVector};
use crate::multiclass::MulticlassModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

/// Serializable representation of a trained multi-class model
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableModel {
    /// Class labels in model order
    pub labels: Vec<f64>,
    /// Number of support vectors per class
    pub sv_count_per_class: Vec<usize>,
    /// Support vectors, grouped by class
    pub support_vectors: Vec<SerializableVector>,
    /// 1-based training-set positions of the support vectors
    pub sv_indices: Vec<usize>,
    /// `(classes - 1) x n_support_vectors` coefficient table
    pub coefficients: Vec<Vec<f64>>,
    /// One bias per class pair
    pub bias: Vec<f64>,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Serializable sparse vector
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializableVector {
    /// Feature indices
    pub indices: Vec<usize>,
    /// Feature values
    pub values: Vec<f64>,
}

/// Model metadata for tracking and validation
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Kernel identifier
    pub kernel_type: String,
    /// Number of support vectors
    pub n_support_vectors: usize,
    /// Training parameters used
    pub training_params: TrainingParams,
    /// Creation timestamp
    pub created_at: String,
}

/// Training parameters, needed again at prediction time for gamma
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrainingParams {
    pub c: f64,
    pub gamma: f64,
    pub epsilon: f64,
    pub max_iterations: Option<usize>,
}

impl From<&SparseVector> for SerializableVector {
    fn from(v: &SparseVector) -> Self {
        Self {
            indices: v.indices.clone(),
            values: v.values.clone(),
        }
    }
}

impl TryFrom<&SerializableVector> for SparseVector {
    type Error = SVMError;

    fn try_from(v: &SerializableVector) -> Result<Self> {
        if v.indices.len() != v.values.len() {
            return Err(SVMError::SerializationError(format!(
                "support vector has {} indices but {} values",
                v.indices.len(),
                v.values.len()
            )));
        }
        if let Some(position) = v.indices.windows(2).position(|w| w[0] >= w[1]) {
            return Err(SVMError::UnsortedIndices {
                position: position + 1,
            });
        }
        Ok(SparseVector {
            indices: v.indices.clone(),
            values: v.values.clone(),
        })
    }
}

impl From<&SolverConfig> for TrainingParams {
    fn from(config: &SolverConfig) -> Self {
        Self {
            c: config.c,
            gamma: config.gamma,
            epsilon: config.epsilon,
            max_iterations: config.max_iterations,
        }
    }
}

impl From<&TrainingParams> for SolverConfig {
    fn from(params: &TrainingParams) -> Self {
        Self {
            c: params.c,
            gamma: params.gamma,
            epsilon: params.epsilon,
            max_iterations: params.max_iterations,
        }
    }
}

impl SerializableModel {
    /// Create a serializable model from a trained model
    pub fn from_model(model: &MulticlassModel) -> Self {
        let support_vectors: Vec<SerializableVector> = model
            .support_vectors()
            .iter()
            .map(|sv| SerializableVector::from(sv.as_ref()))
            .collect();

        Self {
            labels: model.labels().to_vec(),
            sv_count_per_class: model.sv_count_per_class().to_vec(),
            sv_indices: model.support_vector_indices().to_vec(),
            coefficients: model.coefficients().to_vec(),
            bias: model.bias().to_vec(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                kernel_type: "rbf".to_string(),
                n_support_vectors: support_vectors.len(),
                training_params: TrainingParams::from(model.config()),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            support_vectors,
        }
    }

    /// Rebuild the trained model
    pub fn to_model(&self) -> Result<MulticlassModel> {
        if self.metadata.kernel_type != "rbf" {
            return Err(SVMError::SerializationError(format!(
                "unsupported kernel type: {}",
                self.metadata.kernel_type
            )));
        }

        let support_vectors = self
            .support_vectors
            .iter()
            .map(|v| SparseVector::try_from(v).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;

        MulticlassModel::from_parts(
            SolverConfig::from(&self.metadata.training_params),
            self.labels.clone(),
            self.sv_count_per_class.clone(),
            support_vectors,
            self.sv_indices.clone(),
            self.coefficients.clone(),
            self.bias.clone(),
        )
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path).map_err(SVMError::IoError)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)
            .map_err(|e| SVMError::SerializationError(e.to_string()))?;
        Ok(model)
    }
}

/// Human-readable model summary
impl fmt::Display for SerializableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = &self.metadata.training_params;
        writeln!(f, "=== SVM Model Summary ===")?;
        writeln!(f, "Kernel Type: {}", self.metadata.kernel_type)?;
        writeln!(f, "Classes: {} {:?}", self.labels.len(), self.labels)?;
        writeln!(f, "Support Vectors: {}", self.metadata.n_support_vectors)?;
        writeln!(f, "Support Vectors per Class: {:?}", self.sv_count_per_class)?;
        writeln!(f, "Library Version: {}", self.metadata.library_version)?;
        writeln!(f, "Created: {}", self.metadata.created_at)?;
        writeln!(f, "Training Parameters:")?;
        writeln!(f, "  C: {}", params.c)?;
        writeln!(f, "  Gamma: {}", params.gamma)?;
        writeln!(f, "  Epsilon: {}", params.epsilon)?;
        match params.max_iterations {
            Some(n) => writeln!(f, "  Max Iterations: {n}"),
            None => writeln!(f, "  Max Iterations: unbounded"),
        }
    }
}
