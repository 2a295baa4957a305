//! Named parameter and gradient collections
//!
//! A [`ParameterSet`] maps parameter names ("W1", "b1", ...) to tensors. It
//! is backed by an ordered map, so every iteration visits keys in ascending
//! lexicographic order no matter how the collection was built. Gradient
//! collections share the same representation via [`GradientSet`].

use crate::tensor::Tensor;
use std::collections::BTreeMap;
use std::ops::Index;

/// Mapping from parameter name to tensor, iterated in sorted key order.
///
/// # Example
///
/// ```
/// use grad_check::{ParameterSet, Tensor};
///
/// let params = ParameterSet::new()
///     .with("b1", Tensor::from_vec(vec![0.0, 0.0]))
///     .with("W1", Tensor::zeros(&[3, 2]));
///
/// let keys: Vec<&str> = params.keys().collect();
/// assert_eq!(keys, vec!["W1", "b1"]);
/// assert_eq!(params.num_scalars(), 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    tensors: BTreeMap<String, Tensor>,
}

/// Gradient collection: same keys and shapes as the parameters it belongs to,
/// holding one gradient value per parameter scalar.
pub type GradientSet = ParameterSet;

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tensor, returning the previous tensor stored under `name`.
    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.tensors.insert(name.into(), tensor)
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.insert(name, tensor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tensor> {
        self.tensors.get_mut(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    /// Parameter names in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// `(name, tensor)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of named tensors.
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total number of scalar entries across all tensors.
    pub fn num_scalars(&self) -> usize {
        self.tensors.values().map(Tensor::len).sum()
    }

    /// Collection with the same keys and shapes, filled with zeros.
    pub fn zeros_like(&self) -> Self {
        self.tensors
            .iter()
            .map(|(k, v)| (k.clone(), Tensor::zeros_like(v)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Tensor)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, Tensor)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Index<&str> for ParameterSet {
    type Output = Tensor;

    fn index(&self, name: &str) -> &Tensor {
        match self.tensors.get(name) {
            Some(tensor) => tensor,
            None => panic!("no parameter named '{}'", name),
        }
    }
}
