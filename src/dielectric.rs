// src/dielectric.rs
//
// Smooth spherical dielectric interface built from a shifted error function.
//
// The interface function
//
//   h(r) = 0.5 * (1 + erf((|r - center| - radius) / softness))
//
// runs from 0 inside the cavity to 1 in the dielectric continuum, and the
// permittivity is eps(r) = 1 + (eps0 - 1) * h(r), so eps = 1 in the cavity
// and eps = eps0 far outside. The gradient of ln(eps) is evaluated
// analytically (not by finite differences): with u = (|d| - radius)/softness,
//
//   d(eps)/d|d| = (eps0 - 1) * exp(-u^2) / (softness * sqrt(pi))
//   grad(ln eps) = d(eps)/d|d| / eps * d/|d|

use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;
use crate::special::erf;
use crate::vector_field::VectorField3D;

use std::f64::consts::PI;

/// Spherical erf-smoothed dielectric interface.
///
/// `center` is in centered cell coordinates; all geometry is carried here
/// explicitly rather than captured from the environment.
#[derive(Debug, Clone, Copy)]
pub struct DielectricInterface {
    pub center: [f64; 3],
    pub radius: f64,
    pub softness: f64,
    /// Bulk permittivity of the continuum (eps = 1 inside the cavity).
    pub epsilon0: f64,
}

impl DielectricInterface {
    pub fn new(center: [f64; 3], radius: f64, softness: f64, epsilon0: f64) -> Self {
        assert!(radius > 0.0, "interface radius must be positive");
        assert!(softness > 0.0, "interface softness must be positive");
        assert!(
            epsilon0 > 0.0,
            "bulk permittivity must be positive, got {}",
            epsilon0
        );
        Self {
            center,
            radius,
            softness,
            epsilon0,
        }
    }

    /// Pointwise permittivity at distance `dist` from the center.
    #[inline]
    pub fn epsilon_at(&self, dist: f64) -> f64 {
        let u = (dist - self.radius) / self.softness;
        1.0 + (self.epsilon0 - 1.0) * 0.5 * (1.0 + erf(u))
    }

    /// Sample the permittivity field on a grid (minimum-image distances).
    pub fn permittivity(&self, grid: Grid3D) -> ScalarField {
        let iface = *self;
        ScalarField::from_fn(grid, move |r| {
            let d = grid.min_image(r, iface.center);
            let dist = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            iface.epsilon_at(dist)
        })
    }

    /// Sample grad(ln eps) on a grid, using the analytic radial derivative.
    pub fn grad_log_permittivity(&self, grid: Grid3D) -> VectorField3D {
        let iface = *self;
        let sqrt_pi = PI.sqrt();
        VectorField3D::from_fn(grid, move |r| {
            let d = grid.min_image(r, iface.center);
            let dist = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            if dist == 0.0 {
                // Radial direction undefined at the exact center; the
                // derivative there is exponentially small anyway.
                return [0.0; 3];
            }
            let u = (dist - iface.radius) / iface.softness;
            let eps = iface.epsilon_at(dist);
            let deps = (iface.epsilon0 - 1.0) * (-u * u).exp() / (iface.softness * sqrt_pi);
            let scale = deps / eps / dist;
            [d[0] * scale, d[1] * scale, d[2] * scale]
        })
    }
}
