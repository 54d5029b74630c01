//! Multi-class Support Vector Machine with an RBF kernel
//!
//! Binary classifiers are trained with an online worst-violator solver and
//! combined one-vs-one; prediction is by pairwise voting.

pub mod api;
pub mod core;
pub mod data;
pub mod kernel;
pub mod multiclass;
pub mod persistence;
pub mod solver;
pub mod validation;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, ModelInfo, TrainedModel, SVM};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{Result, SVMError};
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{Kernel, RBFKernel};
pub use crate::multiclass::{group_classes, ClassGroups, MulticlassModel, MulticlassTrainer};
pub use crate::solver::{BinaryProblem, WorstViolatorSolver};
pub use crate::validation::{cross_validate, CrossValidationReport, CrossValidator};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
