//! Field-line-tracing FCI map builder.
//!
//! Traces magnetic field lines between neighbouring toroidal planes of
//! a structured 3-D grid, records the landing positions as fractional
//! grid indices, and serializes the result as a grid archive that
//! field-aligned fluid solvers consume. An optional VTK export renders
//! the traced field for inspection.

pub mod field;
pub mod gridfile;
pub mod maps;
pub mod tracer;
pub mod vtk;
