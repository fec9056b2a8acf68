// src/vector_field.rs

use crate::grid::Grid3D;
use crate::scalar_field::ScalarField;

use rayon::prelude::*;

/// Real 3-component vector field on a periodic 3D grid.
/// Each cell stores (vx, vy, vz); represents the electrostatic field and
/// the gradient of the log-permittivity.
#[derive(Debug, Clone)]
pub struct VectorField3D {
    pub grid: Grid3D,
    pub data: Vec<[f64; 3]>,
}

impl VectorField3D {
    /// Create a new field on the given grid, initialised to zero.
    pub fn zeros(grid: Grid3D) -> Self {
        Self {
            grid,
            data: vec![[0.0; 3]; grid.n_cells()],
        }
    }

    /// Build a field from a function of the centered cell coordinates.
    pub fn from_fn<F>(grid: Grid3D, f: F) -> Self
    where
        F: Fn([f64; 3]) -> [f64; 3] + Sync,
    {
        let mut field = Self::zeros(grid);
        let nx = grid.nx;
        let ny = grid.ny;
        field
            .data
            .par_chunks_mut(nx)
            .enumerate()
            .for_each(|(line, row)| {
                let j = line % ny;
                let k = line / ny;
                for (i, v) in row.iter_mut().enumerate() {
                    *v = f(grid.cell_center_centered(i, j, k));
                }
            });
        field
    }

    /// Get the flat index for grid indices (i, j, k).
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        self.grid.idx(i, j, k)
    }

    pub fn set_uniform(&mut self, vx: f64, vy: f64, vz: f64) {
        for cell in &mut self.data {
            *cell = [vx, vy, vz];
        }
    }

    /// Pointwise dot product with another vector field, written into `out`.
    pub fn dot_into(&self, other: &VectorField3D, out: &mut ScalarField) {
        debug_assert!(self.grid == other.grid, "grid mismatch in dot_into");
        debug_assert!(self.grid == out.grid, "grid mismatch in dot_into output");
        out.data
            .par_iter_mut()
            .zip_eq(self.data.par_iter())
            .zip_eq(other.data.par_iter())
            .for_each(|((o, a), b)| {
                *o = a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
            });
    }

    /// Mean value of each component over the grid (serial, deterministic).
    pub fn mean(&self) -> [f64; 3] {
        let mut sum = [0.0; 3];
        for v in &self.data {
            sum[0] += v[0];
            sum[1] += v[1];
            sum[2] += v[2];
        }
        let n = self.data.len().max(1) as f64;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    }
}
