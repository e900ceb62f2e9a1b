//! Kernel support vector classifier.
//!
//! Multi-class problems are decomposed one-vs-one: a binary C-SVC is trained
//! for every pair of classes and each machine casts one vote per row. The
//! class with the most votes wins, the smallest code on ties.
//!
//! Each binary dual
//!
//! ```text
//! min  ½ αᵀQα − eᵀα   s.t.  0 ≤ αᵢ ≤ C,  yᵀα = 0,   Qᵢⱼ = yᵢyⱼK(xᵢ, xⱼ)
//! ```
//!
//! is solved by sequential minimal optimization, picking the maximal
//! violating pair at each step and stopping once the violation drops below
//! `tol`.

use crate::kernel::{scale_gamma, Gamma, Kernel, KernelKind, LinearKernel, RbfKernel};
use crate::model::{argmax, validate_prediction_input, validate_training_data, Classifier};
use crate::{TrainError, TrainResult};
use scirs2_core::ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lower bound on the curvature of a two-variable subproblem.
const TAU: f64 = 1e-12;

/// Configuration for [`SvmClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Box constraint on the dual variables.
    pub c: f64,
    /// Kernel function.
    pub kernel: KernelKind,
    /// Stopping tolerance on the maximal KKT violation.
    pub tol: f64,
    /// Iteration cap per binary machine.
    pub max_iter: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelKind::default(),
            tol: 1e-3,
            max_iter: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ResolvedKernel {
    Linear(LinearKernel),
    Rbf(RbfKernel),
}

impl Kernel for ResolvedKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            ResolvedKernel::Linear(k) => k.compute(x, y),
            ResolvedKernel::Rbf(k) => k.compute(x, y),
        }
    }

    fn name(&self) -> &str {
        match self {
            ResolvedKernel::Linear(k) => k.name(),
            ResolvedKernel::Rbf(k) => k.name(),
        }
    }
}

/// One pairwise machine: votes `positive` when its decision value is > 0.
#[derive(Debug, Clone)]
struct BinaryMachine {
    positive: usize,
    negative: usize,
    /// (support vector position, αᵢyᵢ)
    coefficients: Vec<(usize, f64)>,
    rho: f64,
}

#[derive(Debug, Clone)]
struct FittedSvm {
    kernel: ResolvedKernel,
    support_vectors: Vec<Vec<f64>>,
    machines: Vec<BinaryMachine>,
    classes: Vec<usize>,
    n_features: usize,
}

/// Solution of one binary dual.
struct DualSolution {
    alpha: Vec<f64>,
    rho: f64,
    iterations: usize,
    converged: bool,
}

/// SMO over a precomputed row-major kernel matrix.
fn solve_dual(kernel: &[f64], y: &[f64], c: f64, tol: f64, max_iter: usize) -> DualSolution {
    let n = y.len();
    let k = |i: usize, j: usize| kernel[i * n + j];
    let mut alpha = vec![0.0; n];
    let mut grad = vec![-1.0; n];

    let in_up = |alpha: &[f64], t: usize| {
        (y[t] > 0.0 && alpha[t] < c) || (y[t] < 0.0 && alpha[t] > 0.0)
    };
    let in_low = |alpha: &[f64], t: usize| {
        (y[t] > 0.0 && alpha[t] > 0.0) || (y[t] < 0.0 && alpha[t] < c)
    };

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iter {
        let mut i = None;
        let mut j = None;
        let mut g_max = f64::NEG_INFINITY;
        let mut g_min = f64::INFINITY;
        for t in 0..n {
            let v = -y[t] * grad[t];
            if in_up(&alpha, t) && v > g_max {
                g_max = v;
                i = Some(t);
            }
            if in_low(&alpha, t) && v < g_min {
                g_min = v;
                j = Some(t);
            }
        }

        let (Some(i), Some(j)) = (i, j) else {
            converged = true;
            break;
        };
        if g_max - g_min < tol {
            converged = true;
            break;
        }
        iterations += 1;

        let (old_i, old_j) = (alpha[i], alpha[j]);
        let quad = (k(i, i) + k(j, j) - 2.0 * k(i, j)).max(TAU);

        if y[i] != y[j] {
            let delta = (-grad[i] - grad[j]) / quad;
            let diff = alpha[i] - alpha[j];
            alpha[i] += delta;
            alpha[j] += delta;
            if diff > 0.0 {
                if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = diff;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = -diff;
            }
            if diff > 0.0 {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = c - diff;
                }
            } else if alpha[j] > c {
                alpha[j] = c;
                alpha[i] = c + diff;
            }
        } else {
            let delta = (grad[i] - grad[j]) / quad;
            let sum = alpha[i] + alpha[j];
            alpha[i] -= delta;
            alpha[j] += delta;
            if sum > c {
                if alpha[i] > c {
                    alpha[i] = c;
                    alpha[j] = sum - c;
                }
            } else if alpha[j] < 0.0 {
                alpha[j] = 0.0;
                alpha[i] = sum;
            }
            if sum > c {
                if alpha[j] > c {
                    alpha[j] = c;
                    alpha[i] = sum - c;
                }
            } else if alpha[i] < 0.0 {
                alpha[i] = 0.0;
                alpha[j] = sum;
            }
        }

        let (d_i, d_j) = (alpha[i] - old_i, alpha[j] - old_j);
        for t in 0..n {
            grad[t] += y[t] * (y[i] * k(t, i) * d_i + y[j] * k(t, j) * d_j);
        }
    }

    // Bias from free vectors, or the midpoint of the feasible interval.
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free_count = 0usize;
    for t in 0..n {
        let yg = y[t] * grad[t];
        if alpha[t] >= c {
            if y[t] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if alpha[t] <= 0.0 {
            if y[t] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free_sum += yg;
            free_count += 1;
        }
    }
    let rho = if free_count > 0 {
        free_sum / free_count as f64
    } else {
        (upper + lower) / 2.0
    };

    DualSolution {
        alpha,
        rho,
        iterations,
        converged,
    }
}

/// Kernel support vector classifier (one-vs-one C-SVC).
#[derive(Debug, Clone, Default)]
pub struct SvmClassifier {
    config: SvmConfig,
    fitted: Option<FittedSvm>,
}

impl SvmClassifier {
    /// Create an untrained classifier.
    pub fn new(config: SvmConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Total number of distinct support vectors across all machines.
    pub fn num_support_vectors(&self) -> usize {
        self.fitted.as_ref().map_or(0, |f| f.support_vectors.len())
    }

    fn resolve_kernel(&self, features: &ArrayView2<f64>) -> TrainResult<ResolvedKernel> {
        match self.config.kernel {
            KernelKind::Linear => Ok(ResolvedKernel::Linear(LinearKernel::new())),
            KernelKind::Rbf { gamma } => {
                let value = match gamma {
                    Gamma::Scale => scale_gamma(features.iter().copied(), features.ncols()),
                    Gamma::Value(v) => v,
                };
                RbfKernel::new(value).map(ResolvedKernel::Rbf).ok_or_else(|| {
                    TrainError::InvalidParameter(format!("gamma must be positive, got {}", value))
                })
            }
        }
    }
}

impl Classifier for SvmClassifier {
    fn name(&self) -> &str {
        "SVM"
    }

    fn train(
        &mut self,
        features: &ArrayView2<f64>,
        labels: &ArrayView1<usize>,
    ) -> TrainResult<()> {
        validate_training_data(features, labels)?;
        if self.config.c <= 0.0 {
            return Err(TrainError::InvalidParameter("C must be positive".to_string()));
        }
        if self.config.tol <= 0.0 || self.config.tol.is_nan() {
            return Err(TrainError::InvalidParameter(format!(
                "tol must be positive, got {}",
                self.config.tol
            )));
        }

        let mut class_rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            class_rows.entry(label).or_default().push(i);
        }
        if class_rows.len() < 2 {
            return Err(TrainError::InvalidParameter(
                "SVM needs at least two classes".to_string(),
            ));
        }

        let kernel = self.resolve_kernel(features)?;
        let rows: Vec<Vec<f64>> = features.rows().into_iter().map(|r| r.to_vec()).collect();
        let classes: Vec<usize> = class_rows.keys().copied().collect();

        let mut sv_position: HashMap<usize, usize> = HashMap::new();
        let mut support_vectors = Vec::new();
        let mut machines = Vec::new();

        for (a, &positive) in classes.iter().enumerate() {
            for &negative in &classes[a + 1..] {
                let members: Vec<usize> = class_rows[&positive]
                    .iter()
                    .chain(class_rows[&negative].iter())
                    .copied()
                    .collect();
                let y: Vec<f64> = members
                    .iter()
                    .map(|&i| if labels[i] == positive { 1.0 } else { -1.0 })
                    .collect();

                let n = members.len();
                let mut gram = vec![0.0; n * n];
                for p in 0..n {
                    for q in p..n {
                        let value = kernel.compute(&rows[members[p]], &rows[members[q]]);
                        gram[p * n + q] = value;
                        gram[q * n + p] = value;
                    }
                }

                let solution =
                    solve_dual(&gram, &y, self.config.c, self.config.tol, self.config.max_iter);
                if !solution.converged {
                    tracing::warn!(
                        positive,
                        negative,
                        iterations = solution.iterations,
                        "SMO hit the iteration cap before converging"
                    );
                }

                let coefficients = members
                    .iter()
                    .zip(solution.alpha.iter().zip(y.iter()))
                    .filter(|(_, (alpha, _))| **alpha > 0.0)
                    .map(|(&row, (&alpha, &label))| {
                        let pos = *sv_position.entry(row).or_insert_with(|| {
                            support_vectors.push(rows[row].clone());
                            support_vectors.len() - 1
                        });
                        (pos, alpha * label)
                    })
                    .collect();

                machines.push(BinaryMachine {
                    positive,
                    negative,
                    coefficients,
                    rho: solution.rho,
                });
            }
        }

        tracing::debug!(
            kernel = kernel.name(),
            machines = machines.len(),
            support_vectors = support_vectors.len(),
            "Fitted SVM"
        );

        self.fitted = Some(FittedSvm {
            kernel,
            support_vectors,
            machines,
            classes,
            n_features: features.ncols(),
        });
        Ok(())
    }

    fn predict(&self, features: &ArrayView2<f64>) -> TrainResult<Array1<usize>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| TrainError::ModelNotTrained(self.name().to_string()))?;
        validate_prediction_input(features, fitted.n_features)?;

        let class_slot: HashMap<usize, usize> = fitted
            .classes
            .iter()
            .enumerate()
            .map(|(slot, &class)| (class, slot))
            .collect();

        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                let row = row.to_vec();
                let kernel_values: Vec<f64> = fitted
                    .support_vectors
                    .iter()
                    .map(|sv| fitted.kernel.compute(sv, &row))
                    .collect();

                let mut votes = vec![0.0; fitted.classes.len()];
                for machine in &fitted.machines {
                    let decision = machine
                        .coefficients
                        .iter()
                        .map(|&(pos, coef)| coef * kernel_values[pos])
                        .sum::<f64>()
                        - machine.rho;
                    let winner = if decision > 0.0 {
                        machine.positive
                    } else {
                        machine.negative
                    };
                    votes[class_slot[&winner]] += 1.0;
                }
                fitted.classes[argmax(&votes)]
            })
            .collect())
    }

    fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }
}
