// src/metrics.rs
//
// Scalar diagnostics used by the convergence control and by validation code.
//
// All reductions are serial accumulations in index order, so repeated runs
// produce bit-identical metrics regardless of the rayon pool size.

use crate::scalar_field::ScalarField;

/// Quadratic mean: sqrt(sum(f^2) / N), normalised by the grid point count
/// (not weighted by cell volume).
pub fn rms(field: &ScalarField) -> f64 {
    let n = field.data.len().max(1) as f64;
    let sum2: f64 = field.data.iter().map(|&v| v * v).sum();
    (sum2 / n).sqrt()
}

/// Normalised inner product: sum(a*b) / N.
pub fn scalar_product(a: &ScalarField, b: &ScalarField) -> f64 {
    debug_assert!(a.grid == b.grid, "grid mismatch in scalar_product");
    let n = a.data.len().max(1) as f64;
    let sum: f64 = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(&x, &y)| x * y)
        .sum();
    sum / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid3D;

    #[test]
    fn rms_is_zero_iff_field_is_zero() {
        let grid = Grid3D::cubic(4, 4.0);
        let mut f = ScalarField::zeros(grid);
        assert_eq!(rms(&f), 0.0);

        let idx = f.idx(1, 2, 3);
        f.data[idx] = 1e-12;
        assert!(rms(&f) > 0.0);
    }

    #[test]
    fn rms_of_uniform_field_is_its_magnitude() {
        let grid = Grid3D::cubic(4, 4.0);
        let mut f = ScalarField::zeros(grid);
        f.fill(-3.0);
        assert!((rms(&f) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn scalar_product_matches_rms_on_self() {
        let grid = Grid3D::cubic(4, 4.0);
        let f = ScalarField::from_fn(grid, |r| r[0] + 0.5 * r[1]);
        let sp = scalar_product(&f, &f);
        let r = rms(&f);
        assert!(
            (sp - r * r).abs() < 1e-12,
            "scalar_product(f,f)={} vs rms^2={}",
            sp,
            r * r
        );
    }
}
