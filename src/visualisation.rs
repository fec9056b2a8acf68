// src/visualisation.rs

use crate::scalar_field::ScalarField;
use plotters::prelude::*;

/// Map a value to a blue-white-red colour using a *local* min/max,
/// so small variations are still visible.
///
/// lo maps to blue, hi maps to red, midpoint to white.
fn value_to_color(v: f64, lo: f64, hi: f64) -> RGBColor {
    // Protect against lo ~ hi (e.g. a uniform field)
    let mut lo = lo;
    let mut hi = hi;
    if !lo.is_finite() || !hi.is_finite() || (hi - lo).abs() < 1e-12 {
        lo = -1.0;
        hi = 1.0;
    }

    let x = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);

    let r = (255.0 * x) as u8;
    let b = (255.0 * (1.0 - x)) as u8;
    let g = (255.0 * (1.0 - (2.0 * (x - 0.5).abs()))).clamp(0.0, 255.0) as u8;

    RGBColor(r, g, b)
}

/// Save the z-midplane slice of a scalar field as a PNG heat map.
/// - x/y axes are cell indices
/// - colour encodes the value (blue ~ min, white ~ mid, red ~ max)
pub fn save_slice_plot(
    field: &ScalarField,
    title: &str,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let grid = field.grid;
    let nx = grid.nx as i32;
    let ny = grid.ny as i32;
    let k_mid = grid.nz / 2;

    // First pass: find min/max over this slice
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for j in 0..grid.ny {
        for i in 0..grid.nx {
            let v = field.data[grid.idx(i, j, k_mid)];
            if v.is_finite() {
                lo = lo.min(v);
                hi = hi.max(v);
            }
        }
    }

    let root = BitMapBackend::new(filename, (640, 640)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0..nx, 0..ny)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("i")
        .y_desc("j")
        .draw()?;

    chart.draw_series((0..nx).flat_map(|i| {
        (0..ny).map(move |j| (i, j))
    }).map(|(i, j)| {
        let v = field.data[grid.idx(i as usize, j as usize, k_mid)];
        Rectangle::new([(i, j), (i + 1, j + 1)], value_to_color(v, lo, hi).filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Save a 1D profile of a scalar field along x through the cell center.
pub fn save_axis_profile_plot(
    field: &ScalarField,
    title: &str,
    filename: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let grid = field.grid;
    let j = grid.ny / 2;
    let k = grid.nz / 2;

    let profile: Vec<(f64, f64)> = (0..grid.nx)
        .map(|i| {
            let r = grid.cell_center_centered(i, j, k);
            (r[0], field.data[grid.idx(i, j, k)])
        })
        .collect();

    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, v) in &profile {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(hi > lo) {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = 0.05 * (hi - lo);

    let x_lo = profile.first().map(|&(x, _)| x).unwrap_or(0.0);
    let x_hi = profile.last().map(|&(x, _)| x).unwrap_or(1.0);

    let root = BitMapBackend::new(filename, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, (lo - pad)..(hi + pad))?;

    chart.configure_mesh().x_desc("x").draw()?;

    chart.draw_series(LineSeries::new(profile, &BLUE))?;

    root.present()?;
    Ok(())
}
