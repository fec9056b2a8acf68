// src/special.rs
//
// Error function for the dielectric interface profile.
//
// Abramowitz & Stegun 7.1.26 rational approximation, |error| <= 1.5e-7.
// That is far below the smoothing scales used for interface functions
// (softness >= 0.05), so no higher-order implementation is needed here.

/// Error function erf(x).
pub fn erf(x: f64) -> f64 {
    // A&S 7.1.26 is stated for x >= 0; use erf(-x) = -erf(x).
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const P: f64 = 0.327_591_1;
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;

    let t = 1.0 / (1.0 + P * x);
    let poly = t * (A1 + t * (A2 + t * (A3 + t * (A4 + t * A5))));
    sign * (1.0 - poly * (-x * x).exp())
}
