//! Data loading
//!
//! Reads labeled sparse feature vectors from LibSVM text files.

pub mod libsvm;

pub use self::libsvm::*;
