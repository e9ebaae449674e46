//! Exponential-decay fitting for randomized benchmarking.
//!
//! Fits `F(m) = a * p^m + b` by Levenberg–Marquardt least squares and
//! derives the RB error figures from the decay parameter `p`.
//!
//! ```text
//!   1 - p
//!   r_c = (1 - p)(1 - 1/2^n)        Clifford infidelity
//!   r_g = r_c / g                   gate infidelity, g = gates per Clifford
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BenchError, BenchResult};

/// Number of free parameters of the decay model.
const NUM_PARAMS: usize = 3;

/// Minimum number of points accepted by the fit.
pub const MIN_FIT_POINTS: usize = NUM_PARAMS + 1;

const LAMBDA_INITIAL: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e16;
const SSR_FLOOR: f64 = 1e-30;

/// Tuning knobs for [`fit_exponential_decay`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Starting point `[a, b, p]`.
    pub initial: [f64; NUM_PARAMS],
    /// Budget of model evaluations.
    pub max_evaluations: usize,
    /// Relative reduction of the residual sum below which the fit stops.
    pub ftol: f64,
    /// Relative step size below which the fit stops.
    pub xtol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial: [0.5, 0.5, 0.9],
            max_evaluations: 2000,
            ftol: 1e-12,
            xtol: 1e-12,
        }
    }
}

/// Fitted parameters of `a * p^m + b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayFit {
    pub a: f64,
    pub b: f64,
    pub p: f64,
    /// Parameter covariance in `[a, b, p]` order.
    pub covariance: [[f64; NUM_PARAMS]; NUM_PARAMS],
    /// Sum of squared residuals at the solution.
    pub ssr: f64,
    /// Model evaluations spent.
    pub evaluations: usize,
    /// Accepted steps.
    pub iterations: usize,
}

impl DecayFit {
    /// Standard deviations of `[a, b, p]`.
    pub fn stdevs(&self) -> [f64; NUM_PARAMS] {
        std::array::from_fn(|i| self.covariance[i][i].max(0.0).sqrt())
    }

    /// Evaluate the fitted curve at depth `m`.
    pub fn model(&self, m: f64) -> f64 {
        model([self.a, self.b, self.p], m)
    }
}

fn model(theta: [f64; NUM_PARAMS], m: f64) -> f64 {
    let [a, b, p] = theta;
    a * p.powf(m) + b
}

/// Partial derivatives of the model with respect to `[a, b, p]`.
fn gradient(theta: [f64; NUM_PARAMS], m: f64) -> [f64; NUM_PARAMS] {
    let [a, _, p] = theta;
    let dp = if m == 0.0 {
        0.0
    } else {
        a * m * p.powf(m - 1.0)
    };
    [p.powf(m), 1.0, dp]
}

fn sum_squared_residuals(theta: [f64; NUM_PARAMS], xs: &[f64], ys: &[f64]) -> f64 {
    xs.iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - model(theta, x);
            r * r
        })
        .sum()
}

/// `JᵀJ` and `Jᵀr` at `theta`.
fn normal_equations(
    theta: [f64; NUM_PARAMS],
    xs: &[f64],
    ys: &[f64],
) -> ([[f64; NUM_PARAMS]; NUM_PARAMS], [f64; NUM_PARAMS]) {
    let mut jtj = [[0.0; NUM_PARAMS]; NUM_PARAMS];
    let mut jtr = [0.0; NUM_PARAMS];
    for (&x, &y) in xs.iter().zip(ys) {
        let g = gradient(theta, x);
        let r = y - model(theta, x);
        for i in 0..NUM_PARAMS {
            jtr[i] += g[i] * r;
            for j in 0..NUM_PARAMS {
                jtj[i][j] += g[i] * g[j];
            }
        }
    }
    (jtj, jtr)
}

fn norm(v: &[f64; NUM_PARAMS]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Solve `m · x = rhs` by Gaussian elimination with partial pivoting.
pub(crate) fn solve3(
    mut m: [[f64; NUM_PARAMS]; NUM_PARAMS],
    mut rhs: [f64; NUM_PARAMS],
) -> BenchResult<[f64; NUM_PARAMS]> {
    let scale = m
        .iter()
        .flatten()
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(BenchError::SingularMatrix);
    }
    let tolerance = scale * 1e-12;

    for col in 0..NUM_PARAMS {
        let pivot = (col..NUM_PARAMS)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() <= tolerance {
            return Err(BenchError::SingularMatrix);
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..NUM_PARAMS {
            let factor = m[row][col] / m[col][col];
            for k in col..NUM_PARAMS {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0; NUM_PARAMS];
    for row in (0..NUM_PARAMS).rev() {
        let tail: f64 = (row + 1..NUM_PARAMS).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Ok(x)
}

fn invert3(m: [[f64; NUM_PARAMS]; NUM_PARAMS]) -> BenchResult<[[f64; NUM_PARAMS]; NUM_PARAMS]> {
    let mut inverse = [[0.0; NUM_PARAMS]; NUM_PARAMS];
    for col in 0..NUM_PARAMS {
        let mut unit = [0.0; NUM_PARAMS];
        unit[col] = 1.0;
        let x = solve3(m, unit)?;
        for row in 0..NUM_PARAMS {
            inverse[row][col] = x[row];
        }
    }
    Ok(inverse)
}

/// `s² (JᵀJ)⁻¹`, or all `INFINITY` when `JᵀJ` cannot be inverted.
fn covariance(
    jtj: [[f64; NUM_PARAMS]; NUM_PARAMS],
    residual_variance: f64,
) -> [[f64; NUM_PARAMS]; NUM_PARAMS] {
    match invert3(jtj) {
        Ok(mut inverse) if inverse.iter().flatten().all(|v| v.is_finite()) => {
            for row in &mut inverse {
                for v in row.iter_mut() {
                    *v *= residual_variance;
                }
            }
            inverse
        }
        _ => {
            warn!("Covariance of the parameters could not be estimated");
            [[f64::INFINITY; NUM_PARAMS]; NUM_PARAMS]
        }
    }
}

/// Fit `a * p^m + b` to the points `(xs[i], ys[i])`.
///
/// # Errors
///
/// - [`BenchError::DimensionMismatch`] if `xs` and `ys` differ in length.
/// - [`BenchError::InsufficientData`] with fewer than [`MIN_FIT_POINTS`] points.
/// - [`BenchError::FitDidNotConverge`] when the evaluation budget runs out.
///
/// A converged fit is always returned. When `JᵀJ` is singular at the
/// solution, as on flat or barely decaying data, the covariance is filled
/// with `f64::INFINITY`.
pub fn fit_exponential_decay(xs: &[f64], ys: &[f64], options: &FitOptions) -> BenchResult<DecayFit> {
    if xs.len() != ys.len() {
        return Err(BenchError::DimensionMismatch {
            context: "fit data",
            expected: xs.len(),
            actual: ys.len(),
        });
    }
    let n = xs.len();
    if n < MIN_FIT_POINTS {
        return Err(BenchError::InsufficientData {
            needed: MIN_FIT_POINTS,
            got: n,
        });
    }

    let mut theta = options.initial;
    let mut ssr = sum_squared_residuals(theta, xs, ys);
    let mut evaluations = 1;
    let mut iterations = 0;
    let mut lambda = LAMBDA_INITIAL;

    'outer: while ssr >= SSR_FLOOR {
        let (jtj, jtr) = normal_equations(theta, xs, ys);

        loop {
            if evaluations >= options.max_evaluations {
                return Err(BenchError::FitDidNotConverge { evaluations });
            }

            let mut damped = jtj;
            for (i, row) in damped.iter_mut().enumerate() {
                row[i] += lambda * jtj[i][i].max(f64::EPSILON);
            }

            let step = match solve3(damped, jtr) {
                Ok(step) => step,
                Err(_) => {
                    lambda *= 10.0;
                    if lambda > LAMBDA_MAX {
                        break 'outer;
                    }
                    continue;
                }
            };

            let candidate: [f64; NUM_PARAMS] = std::array::from_fn(|i| theta[i] + step[i]);
            let candidate_ssr = sum_squared_residuals(candidate, xs, ys);
            evaluations += 1;

            if candidate_ssr.is_finite() && candidate_ssr < ssr {
                let reduction = ssr - candidate_ssr;
                let small_step = norm(&step) <= options.xtol * (norm(&theta) + options.xtol);
                let small_reduction = reduction <= options.ftol * ssr;

                theta = candidate;
                ssr = candidate_ssr;
                iterations += 1;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);

                if small_step || small_reduction {
                    break 'outer;
                }
                continue 'outer;
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                break 'outer;
            }
        }
    }

    let (jtj, _) = normal_equations(theta, xs, ys);
    let covariance = covariance(jtj, ssr / (n - NUM_PARAMS) as f64);

    let [a, b, p] = theta;
    debug!(
        "Decay fit: a={:.4} b={:.4} p={:.6} after {} evaluations",
        a, b, p, evaluations
    );

    Ok(DecayFit {
        a,
        b,
        p,
        covariance,
        ssr,
        evaluations,
        iterations,
    })
}

/// Compute error per Clifford (EPC) from the decay parameter.
///
/// EPC = (d - 1)(1 - p) / d where d = 2^num_qubits.
pub fn error_per_clifford(p: f64, num_qubits: u32) -> f64 {
    let d = (1u64 << num_qubits) as f64;
    (d - 1.0) * (1.0 - p) / d
}

/// A value with its one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub value: f64,
    pub stdev: f64,
}

/// Decay fit plus the RB error figures derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbFit {
    pub decay: DecayFit,
    pub num_qubits: u32,
    /// Average number of physical gates per Clifford.
    pub gates_per_clifford: f64,
}

impl RbFit {
    pub fn new(decay: DecayFit, num_qubits: u32, gates_per_clifford: f64) -> Self {
        Self {
            decay,
            num_qubits,
            gates_per_clifford,
        }
    }

    /// `1 - p`.
    pub fn error_rate(&self) -> Estimate {
        Estimate {
            value: 1.0 - self.decay.p,
            stdev: self.decay.stdevs()[2],
        }
    }

    /// Clifford set infidelity `r_c`.
    pub fn clifford_infidelity(&self) -> Estimate {
        let scale = error_per_clifford(0.0, self.num_qubits);
        Estimate {
            value: error_per_clifford(self.decay.p, self.num_qubits),
            stdev: self.decay.stdevs()[2] * scale,
        }
    }

    /// Physical gate infidelity `r_g = r_c / g`.
    pub fn gate_infidelity(&self) -> Estimate {
        let r_c = self.clifford_infidelity();
        Estimate {
            value: r_c.value / self.gates_per_clifford,
            stdev: r_c.stdev / self.gates_per_clifford,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(a: f64, b: f64, p: f64, depths: usize) -> (Vec<f64>, Vec<f64>) {
        let xs: Vec<f64> = (1..=depths).map(|m| m as f64).collect();
        let ys = xs.iter().map(|&m| a * p.powf(m) + b).collect();
        (xs, ys)
    }

    #[test]
    fn test_recovers_noiseless_parameters() {
        let (xs, ys) = synthetic(0.45, 0.5, 0.97, 100);
        let fit = fit_exponential_decay(&xs, &ys, &FitOptions::default()).unwrap();

        assert!((fit.a - 0.45).abs() < 1e-6, "a = {}", fit.a);
        assert!((fit.b - 0.5).abs() < 1e-6, "b = {}", fit.b);
        assert!((fit.p - 0.97).abs() < 1e-6, "p = {}", fit.p);
        assert!(fit.evaluations <= 2000);
        assert!((fit.model(10.0) - (0.45 * 0.97_f64.powi(10) + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_recovers_parameters_with_noise() {
        let (xs, mut ys) = synthetic(0.5, 0.48, 0.98, 100);
        for (i, y) in ys.iter_mut().enumerate() {
            *y += 2e-3 * ((i as f64) * 1.7).sin();
        }
        let fit = fit_exponential_decay(&xs, &ys, &FitOptions::default()).unwrap();

        assert!((fit.p - 0.98).abs() < 5e-3, "p = {}", fit.p);
        let stdevs = fit.stdevs();
        assert!(stdevs.iter().all(|s| s.is_finite() && *s > 0.0));
        assert!(stdevs[2] < 1e-2);
    }

    #[test]
    fn test_rejects_too_few_points() {
        let err = fit_exponential_decay(&[1.0, 2.0, 3.0], &[0.9, 0.8, 0.7], &FitOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BenchError::InsufficientData { needed: 4, got: 3 }
        ));
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let err = fit_exponential_decay(&[1.0, 2.0, 3.0, 4.0], &[0.9], &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, BenchError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_degenerate_depths_keep_parameters() {
        let xs = [5.0; 6];
        let ys = [0.8; 6];
        let fit = fit_exponential_decay(&xs, &ys, &FitOptions::default()).unwrap();

        assert!((fit.model(5.0) - 0.8).abs() < 1e-6, "F(5) = {}", fit.model(5.0));
        assert!(fit.covariance.iter().flatten().all(|v| v.is_infinite()));
        assert!(fit.stdevs().iter().all(|s| s.is_infinite()));
    }

    #[test]
    fn test_singular_covariance_is_infinite() {
        let rank_one = [[1.0, 1.0, 0.0], [1.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let cov = covariance(rank_one, 1e-4);
        assert!(cov.iter().flatten().all(|v| *v == f64::INFINITY));

        let diagonal = [[4.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        let cov = covariance(diagonal, 2.0);
        assert!((cov[0][0] - 0.5).abs() < 1e-12);
        assert!((cov[1][1] - 1.0).abs() < 1e-12);
        assert!((cov[2][2] - 2.0).abs() < 1e-12);
        assert_eq!(cov[0][1], 0.0);
    }

    #[test]
    fn test_evaluation_budget() {
        let (xs, ys) = synthetic(0.45, 0.5, 0.97, 50);
        let options = FitOptions {
            max_evaluations: 2,
            ..FitOptions::default()
        };
        let err = fit_exponential_decay(&xs, &ys, &options).unwrap_err();
        assert!(matches!(err, BenchError::FitDidNotConverge { evaluations: 2 }));
    }

    #[test]
    fn test_solve3() {
        let m = [[2.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 4.0]];
        let x = solve3(m, [3.0, 5.0, 5.0]).unwrap();
        for (got, want) in x.iter().zip([1.0, 1.0, 1.0]) {
            assert!((got - want).abs() < 1e-12);
        }

        let singular = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 1.0, 1.0]];
        assert!(matches!(
            solve3(singular, [1.0, 2.0, 3.0]),
            Err(BenchError::SingularMatrix)
        ));
    }

    #[test]
    fn test_error_per_clifford() {
        assert!((error_per_clifford(1.0, 1) - 0.0).abs() < 1e-10);
        assert!((error_per_clifford(0.0, 1) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_derived_figures() {
        let decay = DecayFit {
            a: 0.5,
            b: 0.5,
            p: 0.99,
            covariance: [[0.0; 3], [0.0; 3], [0.0, 0.0, 1e-6]],
            ssr: 0.0,
            evaluations: 1,
            iterations: 0,
        };
        let fit = RbFit::new(decay, 1, 1.875);

        let e = fit.error_rate();
        assert!((e.value - 0.01).abs() < 1e-12);
        assert!((e.stdev - 1e-3).abs() < 1e-12);

        let r_c = fit.clifford_infidelity();
        assert!((r_c.value - 0.005).abs() < 1e-12);
        assert!((r_c.stdev - 5e-4).abs() < 1e-12);

        let r_g = fit.gate_infidelity();
        assert!((r_g.value - 0.005 / 1.875).abs() < 1e-12);
        assert!((r_g.stdev - 5e-4 / 1.875).abs() < 1e-12);
    }
}
