//! Class discovery and class-contiguous ordering of samples

use crate::core::{Result, SVMError};
use std::collections::HashMap;
use std::ops::Range;

/// Samples grouped by class
///
/// Classes are numbered in first-seen order, except that a binary problem
/// whose labels appear as `-1` then `+1` is flipped so `+1` is class 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassGroups {
    /// Label of each class slot
    pub labels: Vec<f64>,
    /// Offset of each class run inside `perm`
    pub start: Vec<usize>,
    /// Number of samples per class
    pub count: Vec<usize>,
    /// Sample indices ordered class by class, original order kept inside a class
    pub perm: Vec<usize>,
}

impl ClassGroups {
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// Positions in `perm` that belong to class `c`
    pub fn range(&self, c: usize) -> Range<usize> {
        self.start[c]..self.start[c] + self.count[c]
    }

    /// Original sample indices of class `c`
    pub fn members(&self, c: usize) -> &[usize] {
        &self.perm[self.range(c)]
    }
}

/// Group sample labels by class
///
/// Labels must be finite integral values; anything else is rejected.
pub fn group_classes(labels: &[f64]) -> Result<ClassGroups> {
    // Keyed on the bit pattern so every distinct label stays distinct;
    // adding 0.0 folds -0.0 into 0.0
    let mut slot_of: HashMap<u64, usize> = HashMap::new();
    let mut class_labels: Vec<f64> = Vec::new();
    let mut count: Vec<usize> = Vec::new();
    let mut slots: Vec<usize> = Vec::with_capacity(labels.len());

    for &label in labels {
        if !label.is_finite() || label.fract() != 0.0 {
            return Err(SVMError::InvalidLabel(label));
        }

        let slot = *slot_of.entry((label + 0.0).to_bits()).or_insert_with(|| {
            class_labels.push(label);
            count.push(0);
            class_labels.len() - 1
        });
        count[slot] += 1;
        slots.push(slot);
    }

    // Binary problems always put +1 first so decision values keep their sign
    if class_labels == [-1.0, 1.0] {
        class_labels.swap(0, 1);
        count.swap(0, 1);
        for slot in &mut slots {
            *slot = 1 - *slot;
        }
    }

    let start = prefix_offsets(&count);

    // Stable counting sort by class slot
    let mut next = start.clone();
    let mut perm = vec![0; labels.len()];
    for (i, &slot) in slots.iter().enumerate() {
        perm[next[slot]] = i;
        next[slot] += 1;
    }

    Ok(ClassGroups {
        labels: class_labels,
        start,
        count,
        perm,
    })
}

/// Exclusive prefix sums of `counts`
pub(crate) fn prefix_offsets(counts: &[usize]) -> Vec<usize> {
    counts
        .iter()
        .scan(0, |acc, &c| {
            let offset = *acc;
            *acc += c;
            Some(offset)
        })
        .collect()
}

/// Number of one-vs-one classifiers for `num_classes` classes
pub fn pair_count(num_classes: usize) -> usize {
    num_classes * num_classes.saturating_sub(1) / 2
}

/// Position of the classifier for classes `(i, j)`, `i < j`
///
/// Pairs are enumerated with `i` in the outer loop and `j` in the inner
/// loop. Bias values, decision values and the coefficient layout of a model
/// all use this order.
pub fn pair_index(i: usize, j: usize, num_classes: usize) -> usize {
    debug_assert!(i < j && j < num_classes);
    i * (2 * num_classes - i - 1) / 2 + (j - i - 1)
}

/// All class pairs in `pair_index` order
pub fn class_pairs(num_classes: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..num_classes).flat_map(move |i| (i + 1..num_classes).map(move |j| (i, j)))
}
