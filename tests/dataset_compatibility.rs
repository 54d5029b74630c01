//! Dataset compatibility and format validation tests
//!
//! Tests for ensuring LibSVM input variations work correctly across the pipeline

use pegasvm::{api::SVM, Dataset, LibSVMDataset};
use std::io::Write;
use tempfile::NamedTempFile;

fn temp_data(data: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    write!(temp_file, "{}", data).expect("Failed to write");
    temp_file.flush().expect("Failed to flush");
    temp_file
}

/// Test LibSVM format variations
#[test]
fn test_libsvm_format_variations() {
    let test_cases = vec![
        // Basic format
        ("+1 1:0.5 3:1.2 7:0.8\n-1 2:0.3 5:2.1\n", "basic format"),
        // With comments and empty lines
        (
            "# This is a comment\n+1 1:0.5 3:1.2\n\n# Another comment\n-1 2:0.3\n",
            "with comments",
        ),
        // Multi-class integer labels
        ("1 1:0.5\n2 1:1.5\n3 1:2.5\n", "three classes"),
        // Negative and zero labels
        ("0 1:0.5\n-4 1:1.5\n7 1:2.5\n0 1:0.6\n", "arbitrary integer labels"),
        // Sparse indices (non-consecutive)
        (
            "+1 1:1.0 10:2.0 100:3.0\n-1 5:1.5 50:2.5 500:3.5\n",
            "sparse indices",
        ),
        // Unsorted indices on a line
        ("+1 3:1.0 1:2.0\n-1 2:1.0\n", "unsorted indices"),
        // Labels written as floats
        ("1.0 1:2.0\n2.0 1:-2.0\n", "float labels"),
    ];

    for (data, description) in test_cases {
        let temp_file = temp_data(data);

        let dataset = LibSVMDataset::from_file(temp_file.path())
            .unwrap_or_else(|e| panic!("Failed to load LibSVM dataset ({description}): {e}"));

        assert!(
            dataset.len() >= 2,
            "Dataset should have at least 2 samples: {}",
            description
        );
        assert!(
            dataset.dim() > 0,
            "Dataset should have dimensions: {}",
            description
        );

        let model = SVM::new()
            .train(&dataset)
            .unwrap_or_else(|e| panic!("Training should succeed for {description}: {e}"));

        // Every prediction is one of the training labels
        let labels = dataset.get_labels();
        for sample in dataset.samples() {
            let prediction = model.predict(&sample.features);
            assert!(
                labels.contains(&prediction.label),
                "Prediction {} is not a training label for: {}",
                prediction.label,
                description
            );
        }
    }
}

/// Test large dimension handling
#[test]
fn test_large_dimensions() {
    let data = "1 1:1.0 10000:2.0 25000:3.0\n2 2:1.0 5000:2.0\n1 1:1.1 25000:3.0\n2 2:0.9 5000:2.1\n";
    let temp_file = temp_data(data);

    let dataset = LibSVMDataset::from_file(temp_file.path()).expect("Failed to load dataset");
    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.dim(), 25000);

    let model = SVM::new()
        .with_gamma(0.1)
        .train(&dataset)
        .expect("Training should succeed");

    let sample = dataset.get_sample(0);
    let prediction = model.predict(&sample.features);
    assert!(prediction.label == 1.0 || prediction.label == 2.0);
}

/// Test malformed data handling
#[test]
fn test_malformed_data_handling() {
    let malformed_cases = vec![
        ("invalid_label 1:1.0\n", "invalid label"),
        ("+1 invalid_feature\n", "invalid feature format"),
        ("+1 0:1.0\n", "zero index"),
        ("+1 -3:1.0\n", "negative index"),
        ("+1 1:invalid_value\n", "invalid feature value"),
        ("+1 2:1.0 2:2.0\n", "duplicate index"),
        ("", "empty file"),
        ("# comments only\n\n", "comments only"),
    ];

    for (data, description) in malformed_cases {
        let temp_file = temp_data(data);
        let result = LibSVMDataset::from_file(temp_file.path());
        assert!(
            result.is_err(),
            "LibSVM should reject malformed data: {}",
            description
        );
    }
}

/// Labels that parse but cannot name a class are rejected at training time
#[test]
fn test_non_integral_labels_rejected_by_training() {
    let temp_file = temp_data("0.5 1:1.0\n1 1:2.0\n");
    let dataset = LibSVMDataset::from_file(temp_file.path()).expect("Parsing should succeed");

    assert!(SVM::new().train(&dataset).is_err());
}

/// Test dataset statistics and validation
#[test]
fn test_dataset_validation() {
    let data = "1 1:3.0 2:4.0\n1 1:2.8 2:4.2\n2 1:-3.0 2:-4.0\n2 1:-2.8 2:-4.2\n3 1:3.0 2:-4.0\n3 1:2.8 2:-4.2\n";
    let temp_file = temp_data(data);

    let dataset = LibSVMDataset::from_file(temp_file.path()).expect("Failed to load dataset");
    let labels = dataset.get_labels();
    for class in [1.0, 2.0, 3.0] {
        assert_eq!(
            labels.iter().filter(|&&l| l == class).count(),
            2,
            "Should have 2 samples of class {class}"
        );
    }
    assert!(dataset.samples().iter().all(|s| s.features.nnz() == 2));

    let model = SVM::new()
        .with_gamma(0.5)
        .with_epsilon(0.1)
        .train(&dataset)
        .expect("Training should succeed");
    let metrics = model.evaluate(&dataset);
    assert_eq!(metrics.total, 6);
    assert_eq!(metrics.accuracy(), 100.0);
    assert_eq!(metrics.confusion.len(), 3);
}
