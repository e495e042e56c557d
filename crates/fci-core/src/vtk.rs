// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — VTK Export
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Conversion of a grid archive into a 3-D visualization file.
//!
//! Writes a legacy-ASCII VTK rectilinear dataset carrying one point
//! vector field `B`. Compiled without the `vtk-export` feature the
//! entry point degrades to a no-op, so pipelines can keep an export
//! step in place on builds without the visualization backend.

use std::path::Path;

use fci_types::error::FciResult;

#[cfg(feature = "vtk-export")]
use crate::gridfile::GridFileReader;
#[cfg(feature = "vtk-export")]
use ndarray::{Array1, Array3};
#[cfg(feature = "vtk-export")]
use std::fs::File;
#[cfg(feature = "vtk-export")]
use std::io::{BufWriter, Write};

/// Default axis and vector scale factor applied on export. Poloidal
/// structure is small against the toroidal extent; the stretch keeps it
/// visible.
pub const DEFAULT_VTK_SCALE: f64 = 5.0;

/// Convert the grid archive at `input` into a VTK rectilinear-grid file
/// at `output`.
///
/// Field vectors come from the stored `bx`/`bz` arrays (with By taken
/// as unity) when present. Archives without them fall back to the
/// displacement encoded in the forward maps: Bx = forward_xt_prime - i,
/// Bz = forward_zt_prime - k, By = dy. That fallback treats index
/// displacements as field components, which is only consistent when the
/// grid steps match; the archive cannot guarantee it.
#[cfg(feature = "vtk-export")]
pub fn export_vtk<P, Q>(input: P, output: Q, scale: f64) -> FciResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut reader = GridFileReader::open(input)?;
    let dx = reader.scalar_f64("dx")?;
    let dy = reader.scalar_f64("dy")?;

    let (bx, by, bz) = if reader.contains("bx") {
        let bx = reader.array3("bx")?;
        let bz = reader.array3("bz")?;
        let by = Array3::ones(bx.dim());
        (bx, by, bz)
    } else {
        let xt = reader.array3("forward_xt_prime")?;
        let zt = reader.array3("forward_zt_prime")?;
        let dim = xt.dim();
        let bx = Array3::from_shape_fn(dim, |(i, j, k)| xt[[i, j, k]] - i as f64);
        let bz = Array3::from_shape_fn(dim, |(i, j, k)| zt[[i, j, k]] - k as f64);
        let by = Array3::from_elem(dim, dy);
        (bx, by, bz)
    };

    let (nx, ny, nz) = bx.dim();
    let dz = nx as f64 * dx / nz as f64;

    let x = scaled_axis(nx, dx, scale);
    let y = scaled_axis(ny, dy, 1.0);
    let z = scaled_axis(nz, dz, scale);

    write_rectilinear(output.as_ref(), &x, &y, &z, &bx, &by, &bz, scale)
}

/// No-op stand-in used when the crate is built without `vtk-export`.
#[cfg(not(feature = "vtk-export"))]
pub fn export_vtk<P, Q>(_input: P, _output: Q, _scale: f64) -> FciResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Ok(())
}

#[cfg(feature = "vtk-export")]
fn scaled_axis(n: usize, step: f64, scale: f64) -> Array1<f64> {
    Array1::linspace(0.0, n as f64 * step, n).mapv(|v| v * scale)
}

#[cfg(feature = "vtk-export")]
#[allow(clippy::too_many_arguments)]
fn write_rectilinear(
    path: &Path,
    x: &Array1<f64>,
    y: &Array1<f64>,
    z: &Array1<f64>,
    bx: &Array3<f64>,
    by: &Array3<f64>,
    bz: &Array3<f64>,
    scale: f64,
) -> FciResult<()> {
    let (nx, ny, nz) = bx.dim();
    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "# vtk DataFile Version 3.0")?;
    writeln!(w, "SCPN FCI grid")?;
    writeln!(w, "ASCII")?;
    writeln!(w, "DATASET RECTILINEAR_GRID")?;
    writeln!(w, "DIMENSIONS {nx} {ny} {nz}")?;
    write_coordinates(&mut w, "X_COORDINATES", x)?;
    write_coordinates(&mut w, "Y_COORDINATES", y)?;
    write_coordinates(&mut w, "Z_COORDINATES", z)?;

    writeln!(w, "POINT_DATA {}", nx * ny * nz)?;
    writeln!(w, "VECTORS B double")?;
    // Legacy VTK point order: x fastest, then y, then z.
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                writeln!(
                    w,
                    "{} {} {}",
                    bx[[i, j, k]] * scale,
                    by[[i, j, k]],
                    bz[[i, j, k]] * scale
                )?;
            }
        }
    }

    w.flush()?;
    Ok(())
}

#[cfg(feature = "vtk-export")]
fn write_coordinates<W: Write>(w: &mut W, label: &str, axis: &Array1<f64>) -> FciResult<()> {
    writeln!(w, "{label} {} double", axis.len())?;
    let line = axis
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "{line}")?;
    Ok(())
}
