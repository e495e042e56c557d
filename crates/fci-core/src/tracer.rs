// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — Field-Line Tracer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Field-line integration across toroidal intervals.

use fci_math::rk4::integrate_interval;
use fci_types::config::TracerConfig;
use fci_types::error::{FciError, FciResult};

use crate::field::MagneticField;

/// Integrates one field line per starting point across a toroidal-angle
/// interval. The map builder depends only on this trait, so adaptive or
/// interpolating tracers can be dropped in without touching it.
pub trait FieldLineTracer {
    /// Follow the field line through every (x_start[n], z_start[n]) pair
    /// from angle `y_start` across the signed offset `y_offset`, returning
    /// final (x, z) positions in input order.
    fn follow_field_lines(
        &self,
        x_start: &[f64],
        z_start: &[f64],
        y_start: f64,
        y_offset: f64,
    ) -> FciResult<Vec<(f64, f64)>>;

    /// True when traces do not depend on `y_start`, so one toroidal
    /// plane can be broadcast to all of them.
    fn is_axisymmetric(&self) -> bool {
        false
    }
}

/// Reference tracer: fixed-step RK4 on the field-direction ODE.
///
/// Deterministic; identical inputs give identical trajectories. A
/// non-finite end position (the field blew up or returned NaN along the
/// way) is reported as a tracing error naming the failing start point.
#[derive(Debug, Clone)]
pub struct Rk4FieldTracer<F> {
    field: F,
    substeps: usize,
}

impl<F: MagneticField> Rk4FieldTracer<F> {
    /// Create a tracer with validated settings.
    pub fn new(field: F, config: TracerConfig) -> FciResult<Self> {
        config.validate()?;
        Ok(Rk4FieldTracer {
            field,
            substeps: config.substeps,
        })
    }

    /// Tracer with the default substep count.
    pub fn with_defaults(field: F) -> Self {
        Rk4FieldTracer {
            field,
            substeps: TracerConfig::default().substeps,
        }
    }
}

impl<F: MagneticField> FieldLineTracer for Rk4FieldTracer<F> {
    fn follow_field_lines(
        &self,
        x_start: &[f64],
        z_start: &[f64],
        y_start: f64,
        y_offset: f64,
    ) -> FciResult<Vec<(f64, f64)>> {
        if x_start.len() != z_start.len() {
            return Err(FciError::Config(format!(
                "start position lengths differ: {} x values vs {} z values",
                x_start.len(),
                z_start.len()
            )));
        }

        let rhs = |y: f64, pos: [f64; 2]| -> [f64; 2] {
            let (dx, dz) = self.field.field_direction(pos[0], pos[1], y);
            [dx, dz]
        };

        let mut ends = Vec::with_capacity(x_start.len());
        for (n, (&x0, &z0)) in x_start.iter().zip(z_start).enumerate() {
            let end = integrate_interval(&rhs, y_start, [x0, z0], y_offset, self.substeps);
            if !end[0].is_finite() || !end[1].is_finite() {
                return Err(FciError::Tracing {
                    y_start,
                    message: format!(
                        "field line {n} from (x, z) = ({x0}, {z0}) diverged over dy = {y_offset}"
                    ),
                });
            }
            ends.push((end[0], end[1]));
        }
        Ok(ends)
    }

    fn is_axisymmetric(&self) -> bool {
        self.field.is_axisymmetric()
    }
}
