// src/sources.rs
//
// Gaussian charge-density generators for periodic cells.
//
// Conventions:
// - Positions use the centered coordinate system of `Grid3D`
//   (origin at the cell center, same as `cell_center_centered`).
// - Distances are minimum-image, so a Gaussian near a face wraps smoothly.
// - All geometry is threaded through arguments; generators hold no state.

use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;

use std::f64::consts::PI;

/// Add a normalised Gaussian charge of total charge `q` and width `sigma`
/// centered at `center`:
///
///   rho(r) = q / (sigma^3 pi^(3/2)) * exp(-|r - center|^2 / sigma^2)
pub fn add_gaussian_charge(rho: &mut ScalarField, center: [f64; 3], sigma: f64, q: f64) {
    assert!(sigma > 0.0, "gaussian width must be positive, got {}", sigma);

    let grid = rho.grid;
    let norm = q / (sigma.powi(3) * PI.powf(1.5));
    let inv_s2 = 1.0 / (sigma * sigma);

    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let r = grid.cell_center_centered(i, j, k);
                let d = grid.min_image(r, center);
                let r2 = d[0] * d[0] + d[1] * d[1] + d[2] * d[2];
                rho.data[grid.idx(i, j, k)] += norm * (-r2 * inv_s2).exp();
            }
        }
    }
}

/// Build a point-dipole-like pair of Gaussian charges: +q at
/// `center + offset*axis_dir` and -q at `center - offset*axis_dir`.
///
/// The resulting density is charge neutral with dipole moment
/// p = 2 * q * offset along the axis.
pub fn gaussian_dipole(
    grid: Grid3D,
    center: [f64; 3],
    axis: usize,
    offset: f64,
    sigma: f64,
    q: f64,
) -> ScalarField {
    assert!(axis < 3, "axis must be 0, 1 or 2, got {}", axis);

    let mut plus = center;
    let mut minus = center;
    plus[axis] += offset;
    minus[axis] -= offset;

    let mut rho = ScalarField::zeros(grid);
    add_gaussian_charge(&mut rho, plus, sigma, q);
    add_gaussian_charge(&mut rho, minus, sigma, -q);
    rho
}

/// Dipole moment of a charge density about the centered origin,
/// p = integral of r * rho(r).
pub fn dipole_moment(rho: &ScalarField) -> [f64; 3] {
    let grid = rho.grid;
    let dv = grid.cell_volume();
    let mut p = [0.0; 3];
    for k in 0..grid.nz {
        for j in 0..grid.ny {
            for i in 0..grid.nx {
                let r = grid.cell_center_centered(i, j, k);
                let c = rho.data[grid.idx(i, j, k)] * dv;
                p[0] += r[0] * c;
                p[1] += r[1] * c;
                p[2] += r[2] * c;
            }
        }
    }
    p
}
