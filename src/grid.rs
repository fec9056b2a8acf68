// src/grid.rs

use std::f64::consts::PI;

/// Periodic 3D orthorhombic lattice descriptor.
///
/// Coordinates are cell-centered; the cell spans [0, lx) x [0, ly) x [0, lz)
/// with all fields treated as periodic across the faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid3D {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Grid3D {
    /// Create a new 3D grid with nx x ny x nz cells and spacings dx, dy, dz.
    pub fn new(nx: usize, ny: usize, nz: usize, dx: f64, dy: f64, dz: f64) -> Self {
        assert!(nx > 0 && ny > 0 && nz > 0, "grid dimensions must be nonzero");
        assert!(
            dx > 0.0 && dy > 0.0 && dz > 0.0,
            "grid spacings must be positive"
        );
        Self {
            nx,
            ny,
            nz,
            dx,
            dy,
            dz,
        }
    }

    /// Cubic cell of side `l` with `n` points per axis.
    pub fn cubic(n: usize, l: f64) -> Self {
        let d = l / n as f64;
        Self::new(n, n, n, d, d, d)
    }

    /// Total number of cells.
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Convert (i, j, k) indices to a flat index into a 1D array.
    /// x is the fastest axis, z the slowest.
    #[inline]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        (k * self.ny + j) * self.nx + i
    }

    pub fn lx(&self) -> f64 {
        self.nx as f64 * self.dx
    }

    pub fn ly(&self) -> f64 {
        self.ny as f64 * self.dy
    }

    pub fn lz(&self) -> f64 {
        self.nz as f64 * self.dz
    }

    /// Volume of one cell.
    pub fn cell_volume(&self) -> f64 {
        self.dx * self.dy * self.dz
    }

    /// Cell-center coordinates, centered at the grid center.
    ///
    /// For i in [0, nx), x = (i + 0.5 - nx/2) * dx, and likewise for y, z.
    #[inline]
    pub fn cell_center_centered(&self, i: usize, j: usize, k: usize) -> [f64; 3] {
        let cx = self.nx as f64 * 0.5;
        let cy = self.ny as f64 * 0.5;
        let cz = self.nz as f64 * 0.5;
        [
            (i as f64 + 0.5 - cx) * self.dx,
            (j as f64 + 0.5 - cy) * self.dy,
            (k as f64 + 0.5 - cz) * self.dz,
        ]
    }

    /// Minimum-image displacement r - r0 for the periodic cell.
    #[inline]
    pub fn min_image(&self, r: [f64; 3], r0: [f64; 3]) -> [f64; 3] {
        [
            wrap_component(r[0] - r0[0], self.lx()),
            wrap_component(r[1] - r0[1], self.ly()),
            wrap_component(r[2] - r0[2], self.lz()),
        ]
    }

    /// FFT-ordered reciprocal wavevectors along x: g = 2*pi*m/lx with
    /// m = 0, 1, .., nx/2, -(nx-1)/2, .., -1.
    pub fn gx(&self) -> Vec<f64> {
        fft_frequencies(self.nx, self.lx())
    }

    /// FFT-ordered reciprocal wavevectors along y.
    pub fn gy(&self) -> Vec<f64> {
        fft_frequencies(self.ny, self.ly())
    }

    /// FFT-ordered reciprocal wavevectors along z.
    pub fn gz(&self) -> Vec<f64> {
        fft_frequencies(self.nz, self.lz())
    }
}

#[inline]
fn wrap_component(mut d: f64, l: f64) -> f64 {
    while d > 0.5 * l {
        d -= l;
    }
    while d < -0.5 * l {
        d += l;
    }
    d
}

fn fft_frequencies(n: usize, l: f64) -> Vec<f64> {
    let step = 2.0 * PI / l;
    (0..n)
        .map(|k| {
            let m = if k <= n / 2 {
                k as isize
            } else {
                k as isize - n as isize
            };
            m as f64 * step
        })
        .collect()
}
