//! Binary SVM solver
//!
//! Implements the online worst-violator solver used for every class pair of
//! the one-vs-one decomposition.

pub mod worst_violator;

pub use self::worst_violator::*;
