//! One-vs-one multi-class decomposition
//!
//! Samples are grouped by class, one binary classifier is trained for every
//! unordered class pair, and the classifiers are packed into a single model
//! that predicts by pairwise voting.

pub mod grouping;
pub mod model;
pub mod trainer;

pub use self::grouping::*;
pub use self::model::*;
pub use self::trainer::*;
