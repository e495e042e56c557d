//! Magnetic-field contract and the analytic fields shipped with the
//! generator.
//!
//! A field reports its poloidal components (Bx, Bz) and toroidal
//! component By at a point (x, z, y). The field-line ODE the tracer
//! integrates is
//!
//!   dx/dy = Bx / By,   dz/dy = Bz / By

use fci_types::config::FieldConfig;

/// Point evaluation contract for a magnetic field on (x, z, y).
pub trait MagneticField {
    /// x-component at (x, z, y).
    fn bx(&self, x: f64, z: f64, y: f64) -> f64;

    /// z-component at (x, z, y).
    fn bz(&self, x: f64, z: f64, y: f64) -> f64;

    /// Toroidal component. Defaults to unity, so fields that only give
    /// poloidal components encode per-radian drift rates directly.
    fn by(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        1.0
    }

    /// Direction of the field line through (x, z, y): the rates of
    /// change of x and z with toroidal angle.
    fn field_direction(&self, x: f64, z: f64, y: f64) -> (f64, f64) {
        let by = self.by(x, z, y);
        (self.bx(x, z, y) / by, self.bz(x, z, y) / by)
    }

    /// True when the field does not depend on the toroidal angle, so
    /// one traced plane can stand in for all of them.
    fn is_axisymmetric(&self) -> bool {
        false
    }

    /// Poloidal magnitude sqrt(Bx^2 + Bz^2), stored as `Bxy` in grid
    /// files.
    fn magnitude(&self, x: f64, z: f64, y: f64) -> f64 {
        let bx = self.bx(x, z, y);
        let bz = self.bz(x, z, y);
        (bx * bx + bz * bz).sqrt()
    }
}

impl<F: MagneticField + ?Sized> MagneticField for &F {
    fn bx(&self, x: f64, z: f64, y: f64) -> f64 {
        (**self).bx(x, z, y)
    }
    fn bz(&self, x: f64, z: f64, y: f64) -> f64 {
        (**self).bz(x, z, y)
    }
    fn by(&self, x: f64, z: f64, y: f64) -> f64 {
        (**self).by(x, z, y)
    }
    fn field_direction(&self, x: f64, z: f64, y: f64) -> (f64, f64) {
        (**self).field_direction(x, z, y)
    }
    fn is_axisymmetric(&self) -> bool {
        (**self).is_axisymmetric()
    }
    fn magnitude(&self, x: f64, z: f64, y: f64) -> f64 {
        (**self).magnitude(x, z, y)
    }
}

/// Purely toroidal field. Both poloidal components vanish, so field
/// lines never leave their starting (x, z) point and the index maps are
/// the identity.
#[derive(Debug, Clone, Copy)]
pub struct UniformField {
    pub bt: f64,
}

impl UniformField {
    pub fn new(bt: f64) -> Self {
        UniformField { bt }
    }
}

impl MagneticField for UniformField {
    fn bx(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        0.0
    }
    fn bz(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        0.0
    }
    fn by(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        self.bt
    }
    fn is_axisymmetric(&self) -> bool {
        true
    }
}

/// Sheared-slab geometry: straight field lines whose pitch varies
/// linearly with distance from the slab centre.
#[derive(Debug, Clone, Copy)]
pub struct ShearedSlab {
    /// Toroidal field strength.
    pub bt: f64,
    /// Poloidal (z) field at the slab centre.
    pub bp: f64,
    /// Radial shear dBz/dx.
    pub bp_prime: f64,
    /// x position of the slab centre.
    pub x_centre: f64,
}

impl ShearedSlab {
    pub fn new(bt: f64, bp: f64, bp_prime: f64, x_centre: f64) -> Self {
        ShearedSlab {
            bt,
            bp,
            bp_prime,
            x_centre,
        }
    }
}

impl MagneticField for ShearedSlab {
    fn bx(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        0.0
    }
    fn bz(&self, x: f64, _z: f64, _y: f64) -> f64 {
        self.bp + (x - self.x_centre) * self.bp_prime
    }
    fn by(&self, _x: f64, _z: f64, _y: f64) -> f64 {
        self.bt
    }
    fn is_axisymmetric(&self) -> bool {
        true
    }
}

/// Analytic field selected by configuration.
#[derive(Debug, Clone, Copy)]
pub enum AnalyticField {
    Uniform(UniformField),
    ShearedSlab(ShearedSlab),
}

impl AnalyticField {
    /// Build the runtime field a `FieldConfig` value describes.
    pub fn from_config(config: &FieldConfig) -> Self {
        match config {
            FieldConfig::Uniform { bt } => AnalyticField::Uniform(UniformField::new(*bt)),
            FieldConfig::ShearedSlab {
                bt,
                bp,
                bp_prime,
                x_centre,
            } => AnalyticField::ShearedSlab(ShearedSlab::new(*bt, *bp, *bp_prime, *x_centre)),
        }
    }
}

impl MagneticField for AnalyticField {
    fn bx(&self, x: f64, z: f64, y: f64) -> f64 {
        match self {
            AnalyticField::Uniform(f) => f.bx(x, z, y),
            AnalyticField::ShearedSlab(f) => f.bx(x, z, y),
        }
    }
    fn bz(&self, x: f64, z: f64, y: f64) -> f64 {
        match self {
            AnalyticField::Uniform(f) => f.bz(x, z, y),
            AnalyticField::ShearedSlab(f) => f.bz(x, z, y),
        }
    }
    fn by(&self, x: f64, z: f64, y: f64) -> f64 {
        match self {
            AnalyticField::Uniform(f) => f.by(x, z, y),
            AnalyticField::ShearedSlab(f) => f.by(x, z, y),
        }
    }
    fn is_axisymmetric(&self) -> bool {
        match self {
            AnalyticField::Uniform(f) => f.is_axisymmetric(),
            AnalyticField::ShearedSlab(f) => f.is_axisymmetric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_field_has_no_poloidal_components() {
        let field = UniformField::new(2.0);
        assert_eq!(field.bx(0.3, 0.7, 1.2), 0.0);
        assert_eq!(field.bz(0.3, 0.7, 1.2), 0.0);
        assert!((field.by(0.3, 0.7, 1.2) - 2.0).abs() < 1e-15);
        let (dx, dz) = field.field_direction(0.3, 0.7, 1.2);
        assert_eq!((dx, dz), (0.0, 0.0));
        assert!(field.is_axisymmetric());
    }

    #[test]
    fn test_sheared_slab_pitch_varies_with_x() {
        let field = ShearedSlab::new(1.0, 0.1, 1.0, 0.05);
        // At the centre the pitch is bp / bt.
        let (dx, dz) = field.field_direction(0.05, 0.0, 0.0);
        assert_eq!(dx, 0.0);
        assert!((dz - 0.1).abs() < 1e-15, "Centre pitch: {dz}");
        // One shear length outward adds bp_prime * dx to Bz.
        let (_, dz_out) = field.field_direction(0.15, 0.0, 0.0);
        assert!(
            (dz_out - 0.2).abs() < 1e-12,
            "Sheared pitch at x = 0.15: {dz_out}"
        );
        assert!(field.is_axisymmetric());
    }

    #[test]
    fn test_magnitude_is_poloidal() {
        let field = ShearedSlab::new(1.0, 3.0, 0.0, 0.0);
        // Bx = 0, Bz = 3: |B_pol| = 3 regardless of the toroidal part.
        assert!((field.magnitude(0.0, 0.0, 0.0) - 3.0).abs() < 1e-15);
    }

    #[test]
    fn test_field_direction_divides_by_toroidal() {
        let field = ShearedSlab::new(2.0, 0.4, 0.0, 0.0);
        let (_, dz) = field.field_direction(0.0, 0.0, 0.0);
        assert!((dz - 0.2).abs() < 1e-15, "Bz/Bt = {dz}, expected 0.2");
    }

    #[test]
    fn test_from_config_dispatch() {
        let cfg = FieldConfig::ShearedSlab {
            bt: 1.0,
            bp: 0.1,
            bp_prime: 1.0,
            x_centre: 0.05,
        };
        let field = AnalyticField::from_config(&cfg);
        assert!(field.is_axisymmetric());
        assert!((field.bz(0.05, 0.0, 0.0) - 0.1).abs() < 1e-15);

        let cfg = FieldConfig::Uniform { bt: 1.5 };
        let field = AnalyticField::from_config(&cfg);
        assert_eq!(field.bx(0.1, 0.2, 0.3), 0.0);
        assert!((field.by(0.1, 0.2, 0.3) - 1.5).abs() < 1e-15);
    }
}
