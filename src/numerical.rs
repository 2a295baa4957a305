//! Numerical gradient by central differences
//!
//! Every scalar entry of every parameter tensor is perturbed on its own:
//!
//! ```text
//! grad[k][i] = (cost(p[k][i] + eps) - cost(p[k][i] - eps)) / (2 * eps)
//! ```
//!
//! The cost function is evaluated twice per scalar, so a sweep costs
//! `2 * params.num_scalars()` forward passes. This is a debugging aid for
//! validating a backpropagation routine, not something to run during
//! training.
//!
//! The cost function reads the perturbed value straight out of the parameter
//! collection. Each perturbation is held by a guard that restores the
//! original value when it goes out of scope, so the collection is left
//! unchanged whether the sweep succeeds, the cost function returns an error,
//! or the cost function panics.

use crate::error::{BoxedCostError, GradCheckError, Result};
use crate::params::{GradientSet, ParameterSet};
use crate::tensor::{unravel_index, Tensor};
use std::convert::Infallible;

/// Default perturbation size.
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Compute the numerical gradient of `cost_fn` with respect to every entry of `params`.
///
/// `cost_fn(x, y, params)` returns `(cost, aux)`; `aux` is ignored so the
/// same forward function used for training can be passed in unchanged.
/// `x` and `y` are forwarded untouched on every call.
///
/// # Errors
///
/// * [`GradCheckError::EmptyParameters`] if `params` holds no tensors
/// * [`GradCheckError::InvalidEpsilon`] unless `epsilon` is finite and positive
/// * [`GradCheckError::NonFiniteCost`] if a perturbed cost is NaN or infinite
///
/// # Example
///
/// ```
/// use grad_check::{compute_numerical_gradient, ParameterSet, Tensor};
///
/// let mut params = ParameterSet::new()
///     .with("W", Tensor::from_rows(&[vec![1.0, 2.0]]).unwrap());
///
/// let cost = |_x: &(), _y: &(), p: &ParameterSet| {
///     let w = &p["W"];
///     (w[[0, 0]].powi(2) + w[[0, 1]].powi(2), ())
/// };
///
/// let grads = compute_numerical_gradient(&mut params, cost, &(), &(), 1e-5).unwrap();
/// assert!((grads["W"][[0, 0]] - 2.0).abs() < 1e-4);
/// assert!((grads["W"][[0, 1]] - 4.0).abs() < 1e-4);
/// ```
pub fn compute_numerical_gradient<X, Y, A, F>(
    params: &mut ParameterSet,
    mut cost_fn: F,
    x: &X,
    y: &Y,
    epsilon: f64,
) -> Result<GradientSet>
where
    X: ?Sized,
    Y: ?Sized,
    F: FnMut(&X, &Y, &ParameterSet) -> (f64, A),
{
    try_compute_numerical_gradient(
        params,
        |x, y, p| Ok::<_, Infallible>(cost_fn(x, y, p)),
        x,
        y,
        epsilon,
    )
}

/// Like [`compute_numerical_gradient`], for a cost function that can fail.
///
/// The first `Err` aborts the sweep and is returned as
/// [`GradCheckError::CostFunction`], naming the parameter and coordinate
/// being perturbed. `params` is restored before this returns.
pub fn try_compute_numerical_gradient<X, Y, A, E, F>(
    params: &mut ParameterSet,
    mut cost_fn: F,
    x: &X,
    y: &Y,
    epsilon: f64,
) -> Result<GradientSet>
where
    X: ?Sized,
    Y: ?Sized,
    F: FnMut(&X, &Y, &ParameterSet) -> std::result::Result<(f64, A), E>,
    E: Into<BoxedCostError>,
{
    if params.is_empty() {
        return Err(GradCheckError::EmptyParameters);
    }
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(GradCheckError::InvalidEpsilon(epsilon));
    }

    let keys: Vec<String> = params.keys().map(str::to_string).collect();
    let mut grads = GradientSet::new();

    for key in &keys {
        let shape = match params.get(key) {
            Some(tensor) => tensor.shape().to_vec(),
            None => return Err(GradCheckError::UnknownParameter(key.clone())),
        };
        let len: usize = shape.iter().product();
        let mut values = Vec::with_capacity(len);

        for offset in 0..len {
            let cost_error = |source: E| GradCheckError::CostFunction {
                key: key.clone(),
                index: unravel_index(&shape, offset),
                source: source.into(),
            };

            let mut perturbation = Perturbation::new(params, key, offset)?;
            let (cost_plus, _) = cost_fn(x, y, perturbation.shifted(epsilon)).map_err(cost_error)?;
            let (cost_minus, _) =
                cost_fn(x, y, perturbation.shifted(-epsilon)).map_err(cost_error)?;
            drop(perturbation);

            if !cost_plus.is_finite() || !cost_minus.is_finite() {
                return Err(GradCheckError::NonFiniteCost {
                    key: key.clone(),
                    index: unravel_index(&shape, offset),
                    cost_plus,
                    cost_minus,
                });
            }
            values.push((cost_plus - cost_minus) / (2.0 * epsilon));
        }

        grads.insert(key.clone(), Tensor::new(shape, values)?);
    }

    Ok(grads)
}

/// Number of cost-function evaluations a full sweep over `params` performs.
pub fn evaluations_required(params: &ParameterSet) -> usize {
    2 * params.num_scalars()
}

/// Exclusive hold on one scalar of a parameter collection.
///
/// The original value is written back on drop.
struct Perturbation<'a> {
    params: &'a mut ParameterSet,
    key: &'a str,
    offset: usize,
    original: f64,
}

impl<'a> Perturbation<'a> {
    /// # Panics
    ///
    /// Panics if `offset` is out of bounds for the tensor named `key`.
    fn new(params: &'a mut ParameterSet, key: &'a str, offset: usize) -> Result<Self> {
        let tensor = params
            .get(key)
            .ok_or_else(|| GradCheckError::UnknownParameter(key.to_string()))?;
        assert!(
            offset < tensor.len(),
            "offset {} out of bounds for '{}' with {} elements",
            offset,
            key,
            tensor.len()
        );
        let original = tensor.as_slice()[offset];
        Ok(Self {
            params,
            key,
            offset,
            original,
        })
    }

    /// Set the held scalar to `original + delta` and expose the collection for reading.
    fn shifted(&mut self, delta: f64) -> &ParameterSet {
        self.write(self.original + delta);
        &*self.params
    }

    fn write(&mut self, value: f64) {
        if let Some(slot) = self
            .params
            .get_mut(self.key)
            .and_then(|tensor| tensor.as_mut_slice().get_mut(self.offset))
        {
            *slot = value;
        }
    }
}

impl Drop for Perturbation<'_> {
    fn drop(&mut self) {
        self.write(self.original);
    }
}
