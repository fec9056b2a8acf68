// src/poisson.rs
//
// Spectral Poisson solver on a periodic grid.
//
// For a total charge density rho, the electrostatic field with
// div E = 4*pi*rho is assembled in reciprocal space as
//
//   E_hat_a(g) = 4*pi*i * g_a * rho_hat(g) / |g|^2
//
// and transformed back. The g=0 (uniform/DC) bin is forced to zero: periodic
// electrostatics only determines the field of the neutralised density, so the
// solver implicitly works against a uniform compensating background. A total
// charge that does not integrate to ~zero therefore leaves the result
// meaningful only up to that background term; this is a modeling precondition
// on the caller, not a runtime error.
//
// For even grid sizes the derivative factor g_a is taken from tables with the
// Nyquist bin zeroed: that bin is its own conjugate partner, and keeping an
// odd operator on it would make the real-space field complex (see
// apply_field_kernel).

use crate::error::GpeError;
use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;
use crate::spectral::{unpack_real, ImagCheck, Spectral3D};
use crate::vector_field::VectorField3D;

use rustfft::num_complex::Complex;

use std::f64::consts::PI;

use rayon::prelude::*;

/// Reusable spectral Poisson solver for one grid: FFT plans, the cached
/// per-axis wavevector tables, and complex scratch.
pub struct PoissonSolver {
    spectral: Spectral3D,
    gx: Vec<f64>,
    gy: Vec<f64>,
    gz: Vec<f64>,
    // First-derivative tables: same as gx/gy/gz except the Nyquist bin
    // (present for even n) is zeroed. That bin has no mirror partner, so an
    // odd operator acting on it would leave the spectrum non-Hermitian and
    // the inverse transform genuinely complex.
    dgx: Vec<f64>,
    dgy: Vec<f64>,
    dgz: Vec<f64>,

    rho_hat: Vec<Complex<f64>>,
    work: Vec<Complex<f64>>,

    /// Policy for the imaginary residue of inverse transforms.
    pub imag_check: ImagCheck,
}

fn derivative_frequencies(mut g: Vec<f64>, n: usize) -> Vec<f64> {
    if n % 2 == 0 {
        g[n / 2] = 0.0;
    }
    g
}

impl PoissonSolver {
    pub fn new(grid: Grid3D) -> Self {
        Self::with_imag_check(grid, ImagCheck::default())
    }

    pub fn with_imag_check(grid: Grid3D, imag_check: ImagCheck) -> Self {
        let zero = Complex::new(0.0, 0.0);
        Self {
            spectral: Spectral3D::new(grid),
            gx: grid.gx(),
            gy: grid.gy(),
            gz: grid.gz(),
            dgx: derivative_frequencies(grid.gx(), grid.nx),
            dgy: derivative_frequencies(grid.gy(), grid.ny),
            dgz: derivative_frequencies(grid.gz(), grid.nz),
            rho_hat: vec![zero; grid.n_cells()],
            work: vec![zero; grid.n_cells()],
            imag_check,
        }
    }

    pub fn grid(&self) -> Grid3D {
        self.spectral.grid()
    }

    /// Solve for the electrostatic field E with div E = 4*pi*rho.
    pub fn solve_field(&mut self, rho: &ScalarField) -> Result<VectorField3D, GpeError> {
        let grid = self.grid();
        if rho.grid != grid {
            return Err(GpeError::GridMismatch {
                context: "solve_field",
                a: rho.grid,
                b: grid,
            });
        }

        self.spectral.pack_real(rho, &mut self.rho_hat);
        self.spectral.forward(&mut self.rho_hat);

        let mut out = VectorField3D::zeros(grid);
        let mut component = ScalarField::zeros(grid);

        for axis in 0..3 {
            self.apply_field_kernel(axis);
            self.spectral.inverse(&mut self.work);
            unpack_real(&self.work, &mut component, self.imag_check)?;

            out.data
                .par_iter_mut()
                .zip_eq(component.data.par_iter())
                .for_each(|(v, &c)| v[axis] = c);
        }

        Ok(out)
    }

    /// Solve for the electrostatic potential with lap phi = -4*pi*rho.
    /// Same DC handling and residue policy as [`Self::solve_field`].
    pub fn solve_potential(&mut self, rho: &ScalarField) -> Result<ScalarField, GpeError> {
        let grid = self.grid();
        if rho.grid != grid {
            return Err(GpeError::GridMismatch {
                context: "solve_potential",
                a: rho.grid,
                b: grid,
            });
        }

        self.spectral.pack_real(rho, &mut self.rho_hat);
        self.spectral.forward(&mut self.rho_hat);

        let (nx, ny) = (grid.nx, grid.ny);
        let gx = &self.gx;
        let gy = &self.gy;
        let gz = &self.gz;
        let rho_hat = &self.rho_hat;

        self.work
            .par_chunks_mut(nx)
            .enumerate()
            .for_each(|(line, row)| {
                let j = line % ny;
                let k = line / ny;
                let gy2z2 = gy[j] * gy[j] + gz[k] * gz[k];
                for (i, w) in row.iter_mut().enumerate() {
                    let g2 = gx[i] * gx[i] + gy2z2;
                    let idx = line * nx + i;
                    if g2 == 0.0 {
                        // DC bin: charge neutrality assumption, see module docs.
                        *w = Complex::new(0.0, 0.0);
                    } else {
                        let f = 4.0 * PI / g2;
                        *w = Complex::new(rho_hat[idx].re * f, rho_hat[idx].im * f);
                    }
                }
            });

        self.spectral.inverse(&mut self.work);
        let mut out = ScalarField::zeros(grid);
        unpack_real(&self.work, &mut out, self.imag_check)?;
        Ok(out)
    }

    /// work(g) = 4*pi*i * g_axis * rho_hat(g) / |g|^2, with the g=0 bin
    /// zeroed (|g|^2 -> 1 there as a placeholder; the numerator's g_axis = 0
    /// already makes the term vanish). The derivative factor comes from the
    /// Nyquist-zeroed tables so the output spectrum stays Hermitian.
    fn apply_field_kernel(&mut self, axis: usize) {
        let grid = self.grid();
        let (nx, ny) = (grid.nx, grid.ny);
        let gx = &self.gx;
        let gy = &self.gy;
        let gz = &self.gz;
        let dgx = &self.dgx;
        let dgy = &self.dgy;
        let dgz = &self.dgz;
        let rho_hat = &self.rho_hat;

        self.work
            .par_chunks_mut(nx)
            .enumerate()
            .for_each(|(line, row)| {
                let j = line % ny;
                let k = line / ny;
                let gy2z2 = gy[j] * gy[j] + gz[k] * gz[k];
                for (i, w) in row.iter_mut().enumerate() {
                    let ga = match axis {
                        0 => dgx[i],
                        1 => dgy[j],
                        _ => dgz[k],
                    };
                    let mut g2 = gx[i] * gx[i] + gy2z2;
                    if g2 == 0.0 {
                        g2 = 1.0;
                    }
                    let f = 4.0 * PI * ga / g2;
                    let idx = line * nx + i;
                    // multiply by i*f
                    *w = Complex::new(-rho_hat[idx].im * f, rho_hat[idx].re * f);
                }
            });
    }
}
