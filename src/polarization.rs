// src/polarization.rs
//
// Self-consistent polarization-charge solver for the Generalized Poisson
// Equation  div(eps grad phi) = -4*pi*rho  on a periodic grid.
//
// The dielectric response is split into a closed-form part
//
//   rho_fixed = (1 - eps)/eps * rho
//
// and an iterative part rho_pol obeying the fixed-point relation
//
//   rho_pol = grad(ln eps) . E[rho + rho_fixed + rho_pol] / (4*pi)
//
// which is iterated with linear mixing until the rms of the update falls
// below tolerance. One Poisson field solve per iteration; the polarization
// field is owned exclusively by the loop for the duration of a call.

use crate::error::GpeError;
use crate::metrics::rms;
use crate::poisson::PoissonSolver;
use crate::scalar_field::ScalarField;
use crate::vector_field::VectorField3D;

use std::f64::consts::PI;

use rayon::prelude::*;

/// How a polarization solve terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Residual fell below tolerance.
    Converged,
    /// Iteration budget ran out before reaching tolerance.
    Exhausted,
    /// Residual grew for `divergence_window` consecutive iterations
    /// (mixing too aggressive for this permittivity contrast).
    Diverged,
}

#[derive(Debug, Clone)]
pub struct PolarizationSettings {
    /// Hard cap on fixed-point iterations. Zero skips the loop entirely and
    /// reports Exhausted with the fixed polarization charge alone.
    pub max_iter: usize,

    /// Convergence tolerance on rms(update).
    pub tol: f64,

    /// Fraction of the new trial solution blended in per iteration.
    /// 1.0 is undamped; values in (0, 1) damp the update.
    pub mixing: f64,

    /// Consecutive residual increases before declaring divergence.
    pub divergence_window: usize,

    /// Print a residual line every N iterations (0 disables).
    pub print_every: usize,
}

impl Default for PolarizationSettings {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1e-5,
            mixing: 0.6,
            divergence_window: 5,
            print_every: 0,
        }
    }
}

/// Result of a polarization solve.
///
/// Both Converged and Exhausted/Diverged outcomes carry a usable field;
/// callers must branch on `stop_reason` to decide how much to trust it.
#[derive(Debug, Clone)]
pub struct PolarizationOutcome {
    /// Total polarization charge density, rho_fixed + rho_pol.
    pub rho_pol_total: ScalarField,
    /// Iterations actually performed.
    pub iterations: usize,
    /// rms of the last update (0.0 when the loop never ran).
    pub final_residual: f64,
    pub stop_reason: StopReason,

    /// Integral of the system charge, recorded at entry (diagnostic; constant
    /// across iterations by construction).
    pub system_charge: f64,
    /// Integral of the fixed polarization charge, recorded at entry.
    pub fixed_charge: f64,
}

impl PolarizationOutcome {
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::Converged
    }
}

/// Solve for the self-consistent polarization charge induced by `rho` in the
/// dielectric described by `epsilon` / `grad_log_epsilon`.
///
/// Preconditions (checked before the loop, returned as errors):
/// - `epsilon` strictly positive pointwise,
/// - all fields and `poisson` share one grid,
/// - `mixing` positive and finite, `tol` positive.
pub fn solve_polarization(
    rho: &ScalarField,
    epsilon: &ScalarField,
    grad_log_epsilon: &VectorField3D,
    poisson: &mut PoissonSolver,
    settings: &PolarizationSettings,
) -> Result<PolarizationOutcome, GpeError> {
    check_preconditions(rho, epsilon, grad_log_epsilon, poisson, settings)?;

    let grid = rho.grid;

    // Closed-form part of the response: rho_fixed = (1 - eps)/eps * rho.
    let mut rho_fixed = ScalarField::zeros(grid);
    rho_fixed
        .data
        .par_iter_mut()
        .zip_eq(rho.data.par_iter())
        .zip_eq(epsilon.data.par_iter())
        .for_each(|((f, &r), &e)| *f = (1.0 - e) / e * r);

    let system_charge = rho.integrate();
    let fixed_charge = rho_fixed.integrate();

    let mut rho_pol = ScalarField::zeros(grid);
    let mut rho_total = ScalarField::zeros(grid);
    let mut trial = ScalarField::zeros(grid);

    let mut iterations = 0;
    let mut final_residual = 0.0;
    let mut stop_reason = StopReason::Exhausted;

    let mut prev_residual = f64::INFINITY;
    let mut growth_streak = 0usize;

    for iter in 1..=settings.max_iter {
        iterations = iter;

        // rho_total = rho + rho_pol + rho_fixed
        rho_total
            .data
            .par_iter_mut()
            .zip_eq(rho.data.par_iter())
            .zip_eq(rho_pol.data.par_iter())
            .zip_eq(rho_fixed.data.par_iter())
            .for_each(|(((t, &r), &p), &f)| *t = r + p + f);

        let e_field = poisson.solve_field(&rho_total)?;

        // Trial update: rho_new = grad(ln eps) . E / (4*pi), then blend
        // mixing * (rho_new - rho_pol) into the running estimate. `trial`
        // holds the applied update so its rms is the convergence metric.
        grad_log_epsilon.dot_into(&e_field, &mut trial);
        let inv_4pi = 1.0 / (4.0 * PI);
        let mixing = settings.mixing;
        trial
            .data
            .par_iter_mut()
            .zip_eq(rho_pol.data.par_iter())
            .for_each(|(d, &p)| *d = mixing * (*d * inv_4pi - p));
        rho_pol.add_assign_field(&trial);

        let residual = rms(&trial);
        final_residual = residual;

        if settings.print_every > 0 && iter % settings.print_every == 0 {
            println!("[polarization] iter {:4}  residual {:.6e}", iter, residual);
        }

        if residual <= settings.tol {
            stop_reason = StopReason::Converged;
            break;
        }

        // Divergence watch: a residual that keeps growing will not come back
        // with plain linear mixing.
        if residual > prev_residual {
            growth_streak += 1;
            if growth_streak >= settings.divergence_window {
                stop_reason = StopReason::Diverged;
                break;
            }
        } else {
            growth_streak = 0;
        }
        prev_residual = residual;
    }

    match stop_reason {
        StopReason::Converged => {
            if settings.print_every > 0 {
                println!(
                    "[polarization] converged at iteration {} (residual {:.3e})",
                    iterations, final_residual
                );
            }
        }
        StopReason::Exhausted => {
            eprintln!(
                "[polarization] warning: not converged after {} iterations (residual {:.3e}, tol {:.3e})",
                iterations, final_residual, settings.tol
            );
        }
        StopReason::Diverged => {
            eprintln!(
                "[polarization] warning: residual diverging after {} iterations (residual {:.3e}); \
                 reduce mixing ({}) or the permittivity contrast",
                iterations, final_residual, settings.mixing
            );
        }
    }

    // Total polarization charge: closed-form part plus the iterated part.
    let mut rho_pol_total = rho_fixed;
    rho_pol_total.add_assign_field(&rho_pol);

    Ok(PolarizationOutcome {
        rho_pol_total,
        iterations,
        final_residual,
        stop_reason,
        system_charge,
        fixed_charge,
    })
}

fn check_preconditions(
    rho: &ScalarField,
    epsilon: &ScalarField,
    grad_log_epsilon: &VectorField3D,
    poisson: &PoissonSolver,
    settings: &PolarizationSettings,
) -> Result<(), GpeError> {
    if epsilon.grid != rho.grid {
        return Err(GpeError::GridMismatch {
            context: "solve_polarization: epsilon",
            a: epsilon.grid,
            b: rho.grid,
        });
    }
    if grad_log_epsilon.grid != rho.grid {
        return Err(GpeError::GridMismatch {
            context: "solve_polarization: grad_log_epsilon",
            a: grad_log_epsilon.grid,
            b: rho.grid,
        });
    }
    if poisson.grid() != rho.grid {
        return Err(GpeError::GridMismatch {
            context: "solve_polarization: poisson solver",
            a: poisson.grid(),
            b: rho.grid,
        });
    }

    // Division by eps happens pointwise; reject before any arithmetic.
    for (index, &value) in epsilon.data.iter().enumerate() {
        if !(value > 0.0) {
            return Err(GpeError::NonPositivePermittivity { index, value });
        }
    }

    if !(settings.mixing > 0.0) || !settings.mixing.is_finite() {
        return Err(GpeError::InvalidParameter {
            parameter: "mixing",
            message: format!("must be positive and finite, got {}", settings.mixing),
        });
    }
    if !(settings.tol > 0.0) {
        return Err(GpeError::InvalidParameter {
            parameter: "tol",
            message: format!("must be positive, got {}", settings.tol),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3D;

    fn uniform_epsilon(grid: Grid3D, value: f64) -> ScalarField {
        let mut eps = ScalarField::zeros(grid);
        eps.fill(value);
        eps
    }

    #[test]
    fn vacuum_permittivity_returns_zero_in_one_step() {
        // eps = 1 everywhere: grad(ln eps) = 0, rho_fixed = 0, so the first
        // update is exactly zero and the solver converges immediately.
        let grid = Grid3D::cubic(8, 8.0);
        let rho = ScalarField::from_fn(grid, |r| (-(r[0] * r[0])).exp() - 0.1);
        let eps = uniform_epsilon(grid, 1.0);
        let grad = VectorField3D::zeros(grid);

        let mut poisson = PoissonSolver::new(grid);
        let outcome = solve_polarization(
            &rho,
            &eps,
            &grad,
            &mut poisson,
            &PolarizationSettings::default(),
        )
        .expect("solve");

        assert!(outcome.converged());
        assert!(outcome.iterations <= 1, "took {} iterations", outcome.iterations);
        assert_eq!(outcome.final_residual, 0.0);
        assert!(outcome.rho_pol_total.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn zero_max_iter_returns_exhausted_with_fixed_charge_only() {
        let grid = Grid3D::cubic(8, 8.0);
        let rho = ScalarField::from_fn(grid, |r| (-(r[0] * r[0] + r[1] * r[1])).exp());
        let eps = uniform_epsilon(grid, 2.0);
        let grad = VectorField3D::zeros(grid);

        let settings = PolarizationSettings {
            max_iter: 0,
            ..Default::default()
        };
        let mut poisson = PoissonSolver::new(grid);
        let outcome =
            solve_polarization(&rho, &eps, &grad, &mut poisson, &settings).expect("solve");

        assert_eq!(outcome.stop_reason, StopReason::Exhausted);
        assert_eq!(outcome.iterations, 0);

        // With eps = 2, rho_fixed = -rho/2 and no iteration ran.
        for (got, &r) in outcome.rho_pol_total.data.iter().zip(rho.data.iter()) {
            assert!(
                (got + 0.5 * r).abs() < 1e-14,
                "expected fixed charge only: got {}, rho {}",
                got,
                r
            );
        }
    }

    #[test]
    fn non_positive_permittivity_is_rejected_before_iterating() {
        let grid = Grid3D::cubic(4, 4.0);
        let rho = ScalarField::zeros(grid);
        let mut eps = uniform_epsilon(grid, 80.0);
        let bad = eps.idx(2, 1, 3);
        eps.data[bad] = 0.0;
        let grad = VectorField3D::zeros(grid);

        let mut poisson = PoissonSolver::new(grid);
        let err = solve_polarization(
            &rho,
            &eps,
            &grad,
            &mut poisson,
            &PolarizationSettings::default(),
        );
        match err {
            Err(GpeError::NonPositivePermittivity { index, value }) => {
                assert_eq!(index, bad);
                assert_eq!(value, 0.0);
            }
            other => panic!("expected NonPositivePermittivity, got {:?}", other),
        }
    }

    #[test]
    fn invalid_mixing_and_tolerance_are_rejected() {
        let grid = Grid3D::cubic(4, 4.0);
        let rho = ScalarField::zeros(grid);
        let eps = uniform_epsilon(grid, 2.0);
        let grad = VectorField3D::zeros(grid);
        let mut poisson = PoissonSolver::new(grid);

        for (mixing, tol) in [(0.0, 1e-5), (-0.5, 1e-5), (f64::NAN, 1e-5), (0.6, 0.0)] {
            let settings = PolarizationSettings {
                mixing,
                tol,
                ..Default::default()
            };
            assert!(
                matches!(
                    solve_polarization(&rho, &eps, &grad, &mut poisson, &settings),
                    Err(GpeError::InvalidParameter { .. })
                ),
                "mixing={}, tol={} should be rejected",
                mixing,
                tol
            );
        }
    }

    #[test]
    fn mismatched_grids_are_rejected() {
        let grid = Grid3D::cubic(4, 4.0);
        let other = Grid3D::cubic(8, 4.0);
        let rho = ScalarField::zeros(grid);
        let eps = uniform_epsilon(other, 2.0);
        let grad = VectorField3D::zeros(grid);
        let mut poisson = PoissonSolver::new(grid);

        assert!(matches!(
            solve_polarization(
                &rho,
                &eps,
                &grad,
                &mut poisson,
                &PolarizationSettings::default()
            ),
            Err(GpeError::GridMismatch { .. })
        ));
    }
}
