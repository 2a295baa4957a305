//! Dense tensor storage
//!
//! A [`Tensor`] is an owned multi-dimensional `f64` buffer stored in row-major
//! order, the same flat layout the dense layers of a network use for their
//! weight matrices.

use crate::error::{GradCheckError, Result};
use std::ops::Index;

/// Owned row-major tensor of `f64` values.
///
/// The element count is the product of the shape; an empty shape describes a
/// scalar holding exactly one element.
///
/// # Example
///
/// ```
/// use grad_check::Tensor;
///
/// let w = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(w.shape(), &[2, 3]);
/// assert_eq!(w[[1, 0]], 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    /// Create a tensor from a shape and row-major data.
    ///
    /// Fails with [`GradCheckError::TensorShape`] if `data.len()` does not
    /// equal the product of `shape`.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected = element_count(&shape);
        if data.len() != expected {
            return Err(GradCheckError::TensorShape {
                shape,
                expected,
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Tensor of the given shape filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; element_count(shape)],
        }
    }

    /// Zero tensor with the same shape as `other`.
    pub fn zeros_like(other: &Tensor) -> Self {
        Self::zeros(&other.shape)
    }

    /// Zero-dimensional tensor holding a single value.
    pub fn scalar(value: f64) -> Self {
        Self {
            shape: Vec::new(),
            data: vec![value],
        }
    }

    /// One-dimensional tensor (e.g. a bias vector).
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Two-dimensional tensor from a list of rows.
    ///
    /// All rows must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let data: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(vec![rows.len(), cols], data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of scalar elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Flat row-major offset of a multi-index, or `None` if out of bounds.
    pub fn offset(&self, index: &[usize]) -> Option<usize> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(self.shape.iter()) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        Some(offset)
    }

    /// Multi-index of a flat row-major offset.
    ///
    /// # Panics
    ///
    /// Panics if `offset >= self.len()`.
    pub fn unravel(&self, offset: usize) -> Vec<usize> {
        assert!(
            offset < self.data.len(),
            "offset {} out of bounds for tensor of {} elements",
            offset,
            self.data.len()
        );
        unravel_index(&self.shape, offset)
    }

    pub fn get(&self, index: &[usize]) -> Option<f64> {
        self.offset(index).map(|o| self.data[o])
    }

    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut f64> {
        self.offset(index).map(move |o| &mut self.data[o])
    }
}

impl<const N: usize> Index<[usize; N]> for Tensor {
    type Output = f64;

    fn index(&self, index: [usize; N]) -> &f64 {
        match self.offset(&index) {
            Some(o) => &self.data[o],
            None => panic!(
                "index {:?} out of bounds for tensor of shape {:?}",
                index, self.shape
            ),
        }
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major multi-index of `offset` within `shape`.
pub(crate) fn unravel_index(shape: &[usize], offset: usize) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    let mut rest = offset;
    for (slot, &dim) in index.iter_mut().zip(shape.iter()).rev() {
        *slot = rest % dim;
        rest /= dim;
    }
    index
}
