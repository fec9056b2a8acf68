// src/onsager.rs
//
// Analytical Onsager reaction field for a point dipole at the center of a
// spherical cavity (permittivity 1) embedded in a dielectric continuum of
// permittivity eps0. Used as the validation reference for the polarization
// solver on the spherical-interface scenario.

/// Reaction field at the cavity center for dipole moment `dipole`:
///
///   E_r = -2 (eps0 - 1) / (2 eps0 + 1) / radius^3 * p
pub fn onsager_reaction_field(epsilon0: f64, radius: f64, dipole: [f64; 3]) -> [f64; 3] {
    assert!(radius > 0.0, "cavity radius must be positive");
    let factor = -2.0 * (epsilon0 - 1.0) / (2.0 * epsilon0 + 1.0) / radius.powi(3);
    [
        factor * dipole[0],
        factor * dipole[1],
        factor * dipole[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_field_matches_hand_computed_value() {
        // eps0 = 80, a = 1.5, p = [1, 0, 0]:
        // -2*79/161/3.375 = -0.29078...
        let e = onsager_reaction_field(80.0, 1.5, [1.0, 0.0, 0.0]);
        assert!(
            (e[0] + 0.290_78).abs() < 1e-4,
            "expected ~-0.29078, got {}",
            e[0]
        );
        assert_eq!(e[1], 0.0);
        assert_eq!(e[2], 0.0);
    }

    #[test]
    fn vacuum_continuum_has_no_reaction_field() {
        let e = onsager_reaction_field(1.0, 2.0, [0.0, 3.0, 0.0]);
        assert_eq!(e, [0.0; 3]);
    }
}
