//! Kernel functions for the support vector classifier.

use serde::{Deserialize, Serialize};

/// Trait for kernel functions that compute similarity between inputs.
pub trait Kernel: Send + Sync {
    /// Compute kernel value between two rows of equal length.
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Get kernel name for identification.
    fn name(&self) -> &str;
}

/// Linear kernel: K(x, y) = x · y
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
    }

    fn name(&self) -> &str {
        "Linear"
    }
}

/// Gaussian RBF kernel: K(x, y) = exp(-gamma * ||x - y||²)
#[derive(Debug, Clone, Copy)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    /// Create a new RBF kernel; `gamma` must be positive.
    pub fn new(gamma: f64) -> Option<Self> {
        (gamma > 0.0 && gamma.is_finite()).then_some(Self { gamma })
    }

    /// Bandwidth parameter.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Compute squared Euclidean distance
    fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
    }
}

impl Kernel for RbfKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (-self.gamma * Self::squared_distance(x, y)).exp()
    }

    fn name(&self) -> &str {
        "RBF"
    }
}

/// How the RBF bandwidth is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// `1 / (n_features * Var(X))`, computed from the training table.
    Scale,
    /// Fixed bandwidth.
    Value(f64),
}

/// Kernel selection for [`crate::SvmConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelKind {
    /// Plain inner product.
    Linear,
    /// Gaussian radial basis function.
    Rbf {
        /// Bandwidth selection.
        gamma: Gamma,
    },
}

impl Default for KernelKind {
    fn default() -> Self {
        KernelKind::Rbf {
            gamma: Gamma::Scale,
        }
    }
}

/// Resolve `Gamma::Scale` against a training table given as flat values.
pub(crate) fn scale_gamma(values: impl Iterator<Item = f64>, n_features: usize) -> f64 {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 || n_features == 0 {
        return 1.0;
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    if variance > 0.0 {
        1.0 / (n_features as f64 * variance)
    } else {
        1.0
    }
}
