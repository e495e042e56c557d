//! Numerical primitives for the SCPN FCI grid generator.

pub mod fft;
pub mod rk4;
