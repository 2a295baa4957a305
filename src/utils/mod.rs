//! Shared utilities for gradient checks
//!
//! Reproducible random parameter initialisation.

pub mod rng;

pub use rng::SimpleRng;
