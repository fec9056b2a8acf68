// src/scalar_field.rs

use crate::grid::Grid3D;

use rayon::prelude::*;

/// Real scalar field on a periodic 3D grid.
/// Represents charge density, permittivity or polarization charge.
#[derive(Debug, Clone)]
pub struct ScalarField {
    pub grid: Grid3D,
    pub data: Vec<f64>,
}

impl ScalarField {
    /// Create a new field on the given grid, initialised to zero.
    pub fn zeros(grid: Grid3D) -> Self {
        Self {
            grid,
            data: vec![0.0; grid.n_cells()],
        }
    }

    /// Build a field from a function of the centered cell coordinates.
    pub fn from_fn<F>(grid: Grid3D, f: F) -> Self
    where
        F: Fn([f64; 3]) -> f64 + Sync,
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

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Element-wise self += other.
    pub fn add_assign_field(&mut self, other: &ScalarField) {
        debug_assert!(self.grid == other.grid, "grid mismatch in add_assign_field");
        self.data
            .par_iter_mut()
            .zip_eq(other.data.par_iter())
            .for_each(|(a, b)| *a += b);
    }

    /// Element-wise self *= other.
    pub fn mul_assign_field(&mut self, other: &ScalarField) {
        debug_assert!(self.grid == other.grid, "grid mismatch in mul_assign_field");
        self.data
            .par_iter_mut()
            .zip_eq(other.data.par_iter())
            .for_each(|(a, b)| *a *= b);
    }

    /// Element-wise self /= other. The caller is responsible for ensuring
    /// `other` is nonzero everywhere (the polarization solver checks its
    /// permittivity before dividing).
    pub fn div_assign_field(&mut self, other: &ScalarField) {
        debug_assert!(self.grid == other.grid, "grid mismatch in div_assign_field");
        self.data
            .par_iter_mut()
            .zip_eq(other.data.par_iter())
            .for_each(|(a, b)| *a /= b);
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.par_iter_mut().for_each(|a| *a *= factor);
    }

    /// Integral over the cell: sum of values times the cell volume.
    /// Serial accumulation keeps the result deterministic.
    pub fn integrate(&self) -> f64 {
        let sum: f64 = self.data.iter().sum();
        sum * self.grid.cell_volume()
    }

    /// Minimum value over the grid.
    pub fn min_value(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_elementwise() {
        let grid = Grid3D::cubic(4, 4.0);
        let mut a = ScalarField::zeros(grid);
        let mut b = ScalarField::zeros(grid);
        a.fill(2.0);
        b.fill(3.0);

        a.add_assign_field(&b);
        assert!(a.data.iter().all(|&v| (v - 5.0).abs() < 1e-15));

        a.mul_assign_field(&b);
        assert!(a.data.iter().all(|&v| (v - 15.0).abs() < 1e-15));

        b.fill(5.0);
        a.div_assign_field(&b);
        assert!(a.data.iter().all(|&v| (v - 3.0).abs() < 1e-15));

        a.scale(-2.0);
        assert!(a.data.iter().all(|&v| (v + 6.0).abs() < 1e-15));
    }

    #[test]
    fn integrate_accounts_for_cell_volume() {
        let grid = Grid3D::cubic(4, 8.0); // dV = 8
        let mut f = ScalarField::zeros(grid);
        f.fill(1.0);
        let total = f.integrate();
        assert!(
            (total - 512.0).abs() < 1e-12,
            "expected full cell volume 512, got {}",
            total
        );
    }

    #[test]
    fn from_fn_sees_centered_coordinates() {
        let grid = Grid3D::cubic(4, 4.0);
        let f = ScalarField::from_fn(grid, |r| r[0]);
        // x runs over {-1.5, -0.5, 0.5, 1.5}
        assert!((f.data[f.idx(0, 0, 0)] + 1.5).abs() < 1e-12);
        assert!((f.data[f.idx(3, 2, 1)] - 1.5).abs() < 1e-12);
    }
}
