// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{FciError, FciResult};
use ndarray::Array1;

/// Structured 3-D mesh: a radial-like x axis, a toroidal angle y, and a
/// z axis perpendicular to both.
///
/// All axes start at zero with uniform spacing, so a physical x position
/// divided by `delta_x` is directly a fractional x index (same for z).
/// The field-line maps rely on exactly this property.
#[derive(Debug, Clone)]
pub struct Grid {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// x coordinates, length nx: linspace(0, lx, nx).
    pub x: Array1<f64>,
    /// Toroidal angles, length ny: linspace(0, ly, ny).
    pub y: Array1<f64>,
    /// z coordinates, length nz: linspace(0, lz, nz).
    pub z: Array1<f64>,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    /// Major radius; enters only the g_22 metric coefficient.
    pub rmaj: f64,
}

impl Grid {
    /// Build a grid spanning [0, lx] x [0, ly] x [0, lz] with the given
    /// point counts. Counts must be at least 1; lengths and `rmaj` must
    /// be finite and strictly positive.
    pub fn new(
        nx: usize,
        ny: usize,
        nz: usize,
        lx: f64,
        ly: f64,
        lz: f64,
        rmaj: f64,
    ) -> FciResult<Grid> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(FciError::Config(format!(
                "grid point counts must be at least 1, got ({nx}, {ny}, {nz})"
            )));
        }
        for (name, value) in [("lx", lx), ("ly", ly), ("lz", lz), ("rmaj", rmaj)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(FciError::Config(format!(
                    "{name} must be finite and positive, got {value}"
                )));
            }
        }

        let x = Array1::linspace(0.0, lx, nx);
        let y = Array1::linspace(0.0, ly, ny);
        let z = Array1::linspace(0.0, lz, nz);

        // Uniform step; a single-point axis keeps the full length so the
        // index conversion stays well defined.
        let delta_x = if nx > 1 { x[1] - x[0] } else { lx };
        let delta_y = if ny > 1 { y[1] - y[0] } else { ly };
        let delta_z = if nz > 1 { z[1] - z[0] } else { lz };

        Ok(Grid {
            nx,
            ny,
            nz,
            x,
            y,
            z,
            delta_x,
            delta_y,
            delta_z,
            rmaj,
        })
    }

    /// Flattened (x, z) starting mesh covering one toroidal plane, in
    /// x-outer / z-inner order: entry `i * nz + k` holds (x[i], z[k]).
    /// Built once and reused for every plane.
    pub fn xz_mesh(&self) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::with_capacity(self.nx * self.nz);
        let mut zs = Vec::with_capacity(self.nx * self.nz);
        for i in 0..self.nx {
            for k in 0..self.nz {
                xs.push(self.x[i]);
                zs.push(self.z[k]);
            }
        }
        (xs, zs)
    }
}
