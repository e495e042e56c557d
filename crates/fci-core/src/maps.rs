// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — Map Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Forward/backward field-line index maps over a 3-D grid.
//!
//! For every grid point (i, j, k) the builder follows the field line
//! starting at (x[i], z[k]) on toroidal plane y[j] forward by +delta_y
//! and backward by -delta_y, and records where it lands as *fractional
//! grid indices*: the physical end position divided by the x or z grid
//! step. Field-aligned interpolation schemes evaluate neighbouring
//! planes at exactly these positions.
//!
//! Planes are independent: each is computed as a `PlaneMaps` value by a
//! pure worker and merged by plane index, sequentially or across a
//! rayon pool.

use ndarray::{s, Array2, Array3};
use rayon::prelude::*;
use std::sync::Mutex;

use fci_types::error::{FciError, FciResult};
use fci_types::grid::Grid;

use crate::field::MagneticField;
use crate::tracer::{FieldLineTracer, Rk4FieldTracer};

/// Observer for build progress, called with a fraction in [0, 1].
/// Callbacks must not panic; invocation never reorders or aborts
/// tracing.
pub type ProgressFn<'a> = &'a (dyn Fn(f64) + Sync);

/// The four FCI maps of a grid/field pair, each shaped (nx, ny, nz).
/// Entries are fractional x or z indices, not physical coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FciMaps {
    pub forward_xt_prime: Array3<f64>,
    pub forward_zt_prime: Array3<f64>,
    pub backward_xt_prime: Array3<f64>,
    pub backward_zt_prime: Array3<f64>,
}

impl FciMaps {
    fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        FciMaps {
            forward_xt_prime: Array3::zeros((nx, ny, nz)),
            forward_zt_prime: Array3::zeros((nx, ny, nz)),
            backward_xt_prime: Array3::zeros((nx, ny, nz)),
            backward_zt_prime: Array3::zeros((nx, ny, nz)),
        }
    }

    /// Grid shape these maps were built for.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.forward_xt_prime.dim()
    }

    fn set_plane(&mut self, j: usize, plane: &PlaneMaps) {
        self.forward_xt_prime
            .slice_mut(s![.., j, ..])
            .assign(&plane.forward_x);
        self.forward_zt_prime
            .slice_mut(s![.., j, ..])
            .assign(&plane.forward_z);
        self.backward_xt_prime
            .slice_mut(s![.., j, ..])
            .assign(&plane.backward_x);
        self.backward_zt_prime
            .slice_mut(s![.., j, ..])
            .assign(&plane.backward_z);
    }
}

/// One toroidal plane's worth of index maps, shape (nx, nz). Workers
/// return these by value; only the coordinator writes into `FciMaps`.
#[derive(Debug, Clone)]
struct PlaneMaps {
    forward_x: Array2<f64>,
    forward_z: Array2<f64>,
    backward_x: Array2<f64>,
    backward_z: Array2<f64>,
}

/// Trace every starting point of plane `j` in both directions and
/// convert the physical end positions to fractional indices.
fn trace_plane<T>(grid: &Grid, tracer: &T, xs: &[f64], zs: &[f64], j: usize) -> FciResult<PlaneMaps>
where
    T: FieldLineTracer + ?Sized,
{
    let (nx, nz) = (grid.nx, grid.nz);
    let y0 = grid.y[j];

    let forward = tracer.follow_field_lines(xs, zs, y0, grid.delta_y)?;
    let backward = tracer.follow_field_lines(xs, zs, y0, -grid.delta_y)?;
    for (name, ends) in [("forward", &forward), ("backward", &backward)] {
        if ends.len() != nx * nz {
            return Err(FciError::Tracing {
                y_start: y0,
                message: format!(
                    "tracer returned {} {name} end positions for {} starting points",
                    ends.len(),
                    nx * nz
                ),
            });
        }
    }

    let mut plane = PlaneMaps {
        forward_x: Array2::zeros((nx, nz)),
        forward_z: Array2::zeros((nx, nz)),
        backward_x: Array2::zeros((nx, nz)),
        backward_z: Array2::zeros((nx, nz)),
    };
    for i in 0..nx {
        for k in 0..nz {
            let n = i * nz + k;
            plane.forward_x[[i, k]] = forward[n].0 / grid.delta_x;
            plane.forward_z[[i, k]] = forward[n].1 / grid.delta_z;
            plane.backward_x[[i, k]] = backward[n].0 / grid.delta_x;
            plane.backward_z[[i, k]] = backward[n].1 / grid.delta_z;
        }
    }
    Ok(plane)
}

fn plane_fraction(j: usize, ny: usize) -> f64 {
    if ny > 1 {
        j as f64 / (ny - 1) as f64
    } else {
        0.0
    }
}

fn report(progress: Option<ProgressFn<'_>>, fraction: f64) {
    if let Some(f) = progress {
        f(fraction);
    }
}

/// Build the four FCI maps with the reference RK4 tracer at default
/// settings. See [`build_maps_with_tracer`] for the progress contract.
pub fn build_maps<F>(
    grid: &Grid,
    field: &F,
    progress: Option<ProgressFn<'_>>,
) -> FciResult<FciMaps>
where
    F: MagneticField + ?Sized,
{
    let tracer = Rk4FieldTracer::with_defaults(field);
    build_maps_with_tracer(grid, &tracer, progress)
}

/// Build the four FCI maps by driving `tracer` across every toroidal
/// plane in order.
///
/// The progress callback is invoked once per plane before that plane is
/// traced, with fraction j/(ny - 1) (0.0 when ny == 1), so observers
/// see a strictly increasing schedule ending at 1. Any tracer error
/// aborts the whole build; no partial maps value is returned.
///
/// An axisymmetric tracer is asked to trace plane 0 only, and the
/// result is broadcast to every plane. Progress is still reported once
/// per plane.
pub fn build_maps_with_tracer<T>(
    grid: &Grid,
    tracer: &T,
    progress: Option<ProgressFn<'_>>,
) -> FciResult<FciMaps>
where
    T: FieldLineTracer + ?Sized,
{
    let (xs, zs) = grid.xz_mesh();
    let mut maps = FciMaps::zeros(grid.nx, grid.ny, grid.nz);

    if tracer.is_axisymmetric() && grid.ny > 1 {
        report(progress, plane_fraction(0, grid.ny));
        let plane = trace_plane(grid, tracer, &xs, &zs, 0)?;
        maps.set_plane(0, &plane);
        for j in 1..grid.ny {
            report(progress, plane_fraction(j, grid.ny));
            maps.set_plane(j, &plane);
        }
        return Ok(maps);
    }

    for j in 0..grid.ny {
        report(progress, plane_fraction(j, grid.ny));
        let plane = trace_plane(grid, tracer, &xs, &zs, j)?;
        maps.set_plane(j, &plane);
    }
    Ok(maps)
}

/// Build the four FCI maps with one rayon task per toroidal plane.
///
/// Workers return their `PlaneMaps` by value and the merge happens in
/// plane order afterwards, so the output is identical to the sequential
/// builder's. Progress is reported after each completed plane as
/// completed/ny; counter update and callback share one lock, so the
/// observed fractions are monotone non-decreasing even though planes
/// finish out of order. An axisymmetric tracer is handed to
/// [`build_maps_with_tracer`] instead (one traced plane, broadcast),
/// which reports its pre-plane j/(ny - 1) schedule. A tracer error
/// short-circuits outstanding work and the partial plane buffers are
/// dropped.
pub fn build_maps_parallel<T>(
    grid: &Grid,
    tracer: &T,
    progress: Option<ProgressFn<'_>>,
) -> FciResult<FciMaps>
where
    T: FieldLineTracer + Sync + ?Sized,
{
    if tracer.is_axisymmetric() && grid.ny > 1 {
        return build_maps_with_tracer(grid, tracer, progress);
    }

    let (xs, zs) = grid.xz_mesh();
    let ny = grid.ny;
    let completed = Mutex::new(0usize);

    let planes: Vec<PlaneMaps> = (0..ny)
        .into_par_iter()
        .map(|j| {
            let plane = trace_plane(grid, tracer, &xs, &zs, j)?;
            if let Some(f) = progress {
                // Progress is best-effort: a poisoned lock drops the
                // report rather than aborting the build.
                if let Ok(mut count) = completed.lock() {
                    *count += 1;
                    f(*count as f64 / ny as f64);
                }
            }
            Ok(plane)
        })
        .collect::<FciResult<Vec<_>>>()?;

    let mut maps = FciMaps::zeros(grid.nx, grid.ny, grid.nz);
    for (j, plane) in planes.iter().enumerate() {
        maps.set_plane(j, plane);
    }
    Ok(maps)
}
