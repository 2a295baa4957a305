//! Simple random number generator for reproducibility.
//!
//! A lightweight xorshift PRNG used to draw parameter tensors for gradient
//! checks, so that a failing check can be replayed from its seed.

use crate::tensor::Tensor;

/// Xorshift RNG with an explicit seed.
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (if zero, use a fixed value).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    /// Basic xorshift step.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Convert to [0, 1) using the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform sample in [low, high).
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// Tensor of the given shape with entries drawn uniformly from [low, high).
    pub fn uniform_tensor(&mut self, shape: &[usize], low: f64, high: f64) -> Tensor {
        let mut tensor = Tensor::zeros(shape);
        for value in tensor.as_mut_slice() {
            *value = self.gen_range_f64(low, high);
        }
        tensor
    }

    /// Xavier/Glorot uniform weight matrix of shape (fan_in, fan_out).
    ///
    /// Entries are drawn from [-limit, limit) with limit = sqrt(6 / (fan_in + fan_out)).
    pub fn xavier(&mut self, fan_in: usize, fan_out: usize) -> Tensor {
        let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
        self.uniform_tensor(&[fan_in, fan_out], -limit, limit)
    }
}
