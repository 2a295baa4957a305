//! Flatten-and-concatenate helper
//!
//! Turns a gradient collection into a single vector: keys in ascending order,
//! each tensor in row-major order. Two collections with the same keys and
//! shapes always flatten so that equal positions name the same
//! `(key, coordinate)` pair.

use crate::params::ParameterSet;

/// Concatenate every tensor of `set` into one vector in canonical order.
pub fn to_vector(set: &ParameterSet) -> Vec<f64> {
    let mut out = Vec::with_capacity(set.num_scalars());
    for (_, tensor) in set.iter() {
        out.extend_from_slice(tensor.as_slice());
    }
    out
}

/// The `(key, multi-index)` named by each position of [`to_vector`].
pub fn coordinate_labels(set: &ParameterSet) -> Vec<(String, Vec<usize>)> {
    let mut labels = Vec::with_capacity(set.num_scalars());
    for (key, tensor) in set.iter() {
        for offset in 0..tensor.len() {
            labels.push((key.to_string(), tensor.unravel(offset)));
        }
    }
    labels
}
