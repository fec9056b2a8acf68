// src/spectral.rs
//
// 3D complex FFT plumbing on top of rustfft's 1D plans.
//
// Layout convention (matches Grid3D::idx): flat index (k*ny + j)*nx + i,
// x fastest. The x pass runs over contiguous lines directly; the y and z
// passes transpose the target axis to be contiguous in a scratch buffer,
// batch-transform there, and transpose back. rustfft is unnormalised, so the
// inverse applies the 1/N scaling at the end.

use crate::error::GpeError;
use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use std::sync::Arc;

use rayon::prelude::*;

/// Policy for the imaginary residue left by an inverse transform of data
/// that should be real.
///
/// Floating-point roundoff always leaves a tiny imaginary part; `Error`
/// checks that it stays below a relative tolerance before discarding it,
/// `Discard` truncates unconditionally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImagCheck {
    /// Fail with [`GpeError::SpectralResidue`] if max|Im| exceeds
    /// `tol * max|Re|`.
    Error(f64),
    /// Truncate the imaginary part silently.
    Discard,
}

impl Default for ImagCheck {
    fn default() -> Self {
        // Well clear of FFT roundoff (~1e-13 relative) but strict enough to
        // catch a broken spectral kernel.
        ImagCheck::Error(1e-8)
    }
}

/// Forward/inverse 3D FFT plans plus transpose scratch for one grid.
pub struct Spectral3D {
    grid: Grid3D,

    fft_x_fwd: Arc<dyn Fft<f64>>,
    fft_x_inv: Arc<dyn Fft<f64>>,
    fft_y_fwd: Arc<dyn Fft<f64>>,
    fft_y_inv: Arc<dyn Fft<f64>>,
    fft_z_fwd: Arc<dyn Fft<f64>>,
    fft_z_inv: Arc<dyn Fft<f64>>,

    // Scratch for the transpose passes (len = n_cells).
    tmp: Vec<Complex<f64>>,
}

impl Spectral3D {
    pub fn new(grid: Grid3D) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft_x_fwd = planner.plan_fft_forward(grid.nx);
        let fft_x_inv = planner.plan_fft_inverse(grid.nx);
        let fft_y_fwd = planner.plan_fft_forward(grid.ny);
        let fft_y_inv = planner.plan_fft_inverse(grid.ny);
        let fft_z_fwd = planner.plan_fft_forward(grid.nz);
        let fft_z_inv = planner.plan_fft_inverse(grid.nz);

        let zero = Complex::new(0.0, 0.0);
        Self {
            grid,
            fft_x_fwd,
            fft_x_inv,
            fft_y_fwd,
            fft_y_inv,
            fft_z_fwd,
            fft_z_inv,
            tmp: vec![zero; grid.n_cells()],
        }
    }

    pub fn grid(&self) -> Grid3D {
        self.grid
    }

    /// Pack a real field into a complex buffer (imaginary parts zeroed).
    pub fn pack_real(&self, field: &ScalarField, out: &mut [Complex<f64>]) {
        debug_assert_eq!(out.len(), field.data.len());
        out.par_iter_mut()
            .zip_eq(field.data.par_iter())
            .for_each(|(c, &v)| {
                c.re = v;
                c.im = 0.0;
            });
    }

    /// In-place forward 3D transform.
    pub fn forward(&mut self, data: &mut [Complex<f64>]) {
        assert_eq!(data.len(), self.grid.n_cells(), "buffer/grid size mismatch");
        self.pass_x(data, true);
        self.pass_y(data, true);
        self.pass_z(data, true);
    }

    /// In-place inverse 3D transform, including the 1/N normalisation.
    pub fn inverse(&mut self, data: &mut [Complex<f64>]) {
        assert_eq!(data.len(), self.grid.n_cells(), "buffer/grid size mismatch");
        self.pass_x(data, false);
        self.pass_y(data, false);
        self.pass_z(data, false);

        let scale = 1.0 / self.grid.n_cells() as f64;
        data.par_iter_mut().for_each(|v| {
            v.re *= scale;
            v.im *= scale;
        });
    }

    /// x lines are contiguous: transform them directly (parallel over lines).
    fn pass_x(&self, data: &mut [Complex<f64>], forward: bool) {
        let fft = if forward {
            &self.fft_x_fwd
        } else {
            &self.fft_x_inv
        };
        data.par_chunks_mut(self.grid.nx).for_each(|line| {
            fft.process(line);
        });
    }

    /// Transpose y to be contiguous in tmp, batch-transform, transpose back.
    fn pass_y(&mut self, data: &mut [Complex<f64>], forward: bool) {
        let (nx, ny) = (self.grid.nx, self.grid.ny);
        let fft = if forward {
            &self.fft_y_fwd
        } else {
            &self.fft_y_inv
        };

        // tmp[(k*nx + i)*ny + j] = data[(k*ny + j)*nx + i]
        {
            let data_ro: &[Complex<f64>] = &*data;
            self.tmp
                .par_chunks_mut(ny)
                .enumerate()
                .for_each(|(t, line)| {
                    let k = t / nx;
                    let i = t % nx;
                    for (j, v) in line.iter_mut().enumerate() {
                        *v = data_ro[(k * ny + j) * nx + i];
                    }
                });
        }

        self.tmp.par_chunks_mut(ny).for_each(|line| {
            fft.process(line);
        });

        let tmp_ro: &[Complex<f64>] = &self.tmp;
        data.par_chunks_mut(nx).enumerate().for_each(|(line, row)| {
            let j = line % ny;
            let k = line / ny;
            for (i, v) in row.iter_mut().enumerate() {
                *v = tmp_ro[(k * nx + i) * ny + j];
            }
        });
    }

    /// Transpose z to be contiguous in tmp, batch-transform, transpose back.
    fn pass_z(&mut self, data: &mut [Complex<f64>], forward: bool) {
        let (nx, ny, nz) = (self.grid.nx, self.grid.ny, self.grid.nz);
        let fft = if forward {
            &self.fft_z_fwd
        } else {
            &self.fft_z_inv
        };

        // tmp[(j*nx + i)*nz + k] = data[(k*ny + j)*nx + i]
        {
            let data_ro: &[Complex<f64>] = &*data;
            self.tmp
                .par_chunks_mut(nz)
                .enumerate()
                .for_each(|(t, line)| {
                    let j = t / nx;
                    let i = t % nx;
                    for (k, v) in line.iter_mut().enumerate() {
                        *v = data_ro[(k * ny + j) * nx + i];
                    }
                });
        }

        self.tmp.par_chunks_mut(nz).for_each(|line| {
            fft.process(line);
        });

        let tmp_ro: &[Complex<f64>] = &self.tmp;
        data.par_chunks_mut(nx).enumerate().for_each(|(line, row)| {
            let j = line % ny;
            let k = line / ny;
            for (i, v) in row.iter_mut().enumerate() {
                *v = tmp_ro[(j * nx + i) * nz + k];
            }
        });
    }
}

/// Extract the real part of an inverse-transformed buffer, applying the
/// imaginary-residue policy.
pub fn unpack_real(
    data: &[Complex<f64>],
    out: &mut ScalarField,
    check: ImagCheck,
) -> Result<(), GpeError> {
    debug_assert_eq!(data.len(), out.data.len());

    if let ImagCheck::Error(tol) = check {
        let mut max_im: f64 = 0.0;
        let mut max_re: f64 = 0.0;
        for c in data {
            max_im = max_im.max(c.im.abs());
            max_re = max_re.max(c.re.abs());
        }
        // A field that is exactly zero has nothing to check.
        if max_re > 0.0 {
            let residue = max_im / max_re;
            if residue > tol {
                return Err(GpeError::SpectralResidue {
                    residue,
                    allowed: tol,
                });
            }
        }
    }

    out.data
        .par_iter_mut()
        .zip_eq(data.par_iter())
        .for_each(|(o, c)| *o = c.re);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_inverse_roundtrip_recovers_the_field() {
        let grid = Grid3D::new(8, 6, 4, 1.0, 1.0, 1.0);
        let field = ScalarField::from_fn(grid, |r| {
            (0.7 * r[0]).sin() + (0.3 * r[1] * r[2]).cos()
        });

        let mut spectral = Spectral3D::new(grid);
        let mut buf = vec![Complex::new(0.0, 0.0); grid.n_cells()];
        spectral.pack_real(&field, &mut buf);
        spectral.forward(&mut buf);
        spectral.inverse(&mut buf);

        let mut back = ScalarField::zeros(grid);
        unpack_real(&buf, &mut back, ImagCheck::Error(1e-10)).expect("roundtrip residue");

        for (a, b) in field.data.iter().zip(back.data.iter()) {
            assert!(
                (a - b).abs() < 1e-12,
                "roundtrip mismatch: {} vs {}",
                a,
                b
            );
        }
    }

    #[test]
    fn dc_component_is_the_sum() {
        let grid = Grid3D::cubic(4, 4.0);
        let mut field = ScalarField::zeros(grid);
        field.fill(2.0);

        let mut spectral = Spectral3D::new(grid);
        let mut buf = vec![Complex::new(0.0, 0.0); grid.n_cells()];
        spectral.pack_real(&field, &mut buf);
        spectral.forward(&mut buf);

        let n = grid.n_cells() as f64;
        assert!(
            (buf[0].re - 2.0 * n).abs() < 1e-9,
            "DC bin should hold the raw sum, got {}",
            buf[0].re
        );
        // A uniform field has no other spectral content.
        for c in &buf[1..] {
            assert!(c.norm() < 1e-9);
        }
    }

    #[test]
    fn residue_check_rejects_complex_output() {
        let grid = Grid3D::cubic(4, 4.0);
        let mut out = ScalarField::zeros(grid);
        let mut buf = vec![Complex::new(1.0, 0.0); grid.n_cells()];
        buf[3].im = 0.5; // far above any roundoff level

        let err = unpack_real(&buf, &mut out, ImagCheck::Error(1e-8));
        assert!(err.is_err(), "expected SpectralResidue error");

        // Discard mode truncates the same buffer without complaint.
        unpack_real(&buf, &mut out, ImagCheck::Discard).expect("discard mode");
        assert_eq!(out.data[3], 1.0);
    }
}
