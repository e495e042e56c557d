//! Toroidal-axis spectral packing around rustfft.
//!
//! Convention:
//! - Forward transform: FFT along z normalized by 1/nz, packed as
//!   [DC, Re(m=1), Im(m=1), Re(m=2), Im(m=2), ...] over the nz/2 + 1
//!   non-redundant modes of a real signal.
//! - Inverse transform: unpack the Hermitian spectrum, unnormalized
//!   inverse FFT. The 1/nz forward normalization makes the round trip
//!   exact up to floating-point error.

use ndarray::Array3;
use num_complex::Complex64;
use rustfft::FftPlanner;

/// Packed z-length for a real signal of length `nz`: one DC coefficient
/// plus a (Re, Im) pair per remaining mode. nz + 1 for even nz, nz for
/// odd nz. The stored z dimension is a coefficient count rather than a
/// point count, so archives of packed maps leave the nz entry out and
/// let the consumer derive it.
pub fn packed_len(nz: usize) -> usize {
    2 * (nz / 2 + 1) - 1
}

/// Fourier-transform a real (nx, ny, nz) array along its z axis into the
/// packed coefficient layout. Output shape is (nx, ny, packed_len(nz)).
pub fn transform_z(input: &Array3<f64>) -> Array3<f64> {
    let (nx, ny, nz) = input.dim();
    let nmodes = nz / 2 + 1;
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(nz);
    let norm = 1.0 / nz as f64;

    let mut out = Array3::zeros((nx, ny, packed_len(nz)));
    let mut pencil = vec![Complex64::new(0.0, 0.0); nz];
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                pencil[k] = Complex64::new(input[[i, j, k]], 0.0);
            }
            fft.process(&mut pencil);
            out[[i, j, 0]] = pencil[0].re * norm;
            for m in 1..nmodes {
                out[[i, j, 2 * m - 1]] = pencil[m].re * norm;
                out[[i, j, 2 * m]] = pencil[m].im * norm;
            }
        }
    }
    out
}

/// Invert `transform_z`. `nz` is the original z length; the packed
/// layout alone cannot distinguish even nz from odd nz + 1.
///
/// Panics if the packed z-length does not match `packed_len(nz)`.
pub fn inverse_transform_z(packed: &Array3<f64>, nz: usize) -> Array3<f64> {
    let (nx, ny, ncoef) = packed.dim();
    assert_eq!(
        ncoef,
        packed_len(nz),
        "packed z-length {ncoef} does not match nz = {nz}"
    );
    let nmodes = nz / 2 + 1;
    let mut planner = FftPlanner::new();
    let ifft = planner.plan_fft_inverse(nz);

    let mut out = Array3::zeros((nx, ny, nz));
    let mut pencil = vec![Complex64::new(0.0, 0.0); nz];
    for i in 0..nx {
        for j in 0..ny {
            pencil[0] = Complex64::new(packed[[i, j, 0]], 0.0);
            for m in 1..nmodes {
                let c = Complex64::new(packed[[i, j, 2 * m - 1]], packed[[i, j, 2 * m]]);
                pencil[m] = c;
                // The Nyquist bin of an even-length signal is its own
                // mirror; writing the conjugate would clobber it.
                if m != nz - m {
                    pencil[nz - m] = c.conj();
                }
            }
            ifft.process(&mut pencil);
            for k in 0..nz {
                out[[i, j, k]] = pencil[k].re;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(8), 9);
        assert_eq!(packed_len(7), 7);
        assert_eq!(packed_len(2), 3);
        assert_eq!(packed_len(1), 1);
    }

    #[test]
    fn test_roundtrip_even_nz() {
        let original = Array3::from_shape_fn((3, 2, 8), |(i, j, k)| {
            ((i * 16 + j * 8 + k) as f64 * 0.37).sin() + i as f64
        });
        let packed = transform_z(&original);
        assert_eq!(packed.dim(), (3, 2, 9));
        let recovered = inverse_transform_z(&packed, 8);

        for ((i, j, k), &val) in original.indexed_iter() {
            assert!(
                (recovered[[i, j, k]] - val).abs() < 1e-10,
                "Roundtrip failed at ({i}, {j}, {k}): {} vs {val}",
                recovered[[i, j, k]]
            );
        }
    }

    #[test]
    fn test_roundtrip_odd_nz() {
        let original = Array3::from_shape_fn((2, 2, 7), |(i, j, k)| {
            ((i + 2 * j + 3 * k) as f64 * 0.61).cos()
        });
        let packed = transform_z(&original);
        assert_eq!(packed.dim(), (2, 2, 7));
        let recovered = inverse_transform_z(&packed, 7);

        for ((i, j, k), &val) in original.indexed_iter() {
            assert!(
                (recovered[[i, j, k]] - val).abs() < 1e-10,
                "Roundtrip failed at ({i}, {j}, {k}): {} vs {val}",
                recovered[[i, j, k]]
            );
        }
    }

    #[test]
    fn test_constant_signal_packs_to_dc() {
        // A z-constant signal has only the DC coefficient, equal to the
        // value itself under the 1/nz normalization.
        let val = 4.25;
        let input = Array3::from_elem((2, 3, 8), val);
        let packed = transform_z(&input);

        for i in 0..2 {
            for j in 0..3 {
                assert!(
                    (packed[[i, j, 0]] - val).abs() < 1e-12,
                    "DC coefficient: {} vs {val}",
                    packed[[i, j, 0]]
                );
                for c in 1..packed.dim().2 {
                    assert!(
                        packed[[i, j, c]].abs() < 1e-12,
                        "Non-DC coefficient {c} should vanish, got {}",
                        packed[[i, j, c]]
                    );
                }
            }
        }
    }

    #[test]
    fn test_single_mode_coefficients() {
        // cos(2*pi*k/nz) should land entirely in Re(m=1) with amplitude
        // split across the +1/-1 mirror pair: packed value 0.5.
        let nz = 16;
        let input = Array3::from_shape_fn((1, 1, nz), |(_, _, k)| {
            (2.0 * std::f64::consts::PI * k as f64 / nz as f64).cos()
        });
        let packed = transform_z(&input);

        assert!(packed[[0, 0, 0]].abs() < 1e-12, "DC should vanish");
        assert!(
            (packed[[0, 0, 1]] - 0.5).abs() < 1e-12,
            "Re(m=1) = {}, expected 0.5",
            packed[[0, 0, 1]]
        );
        assert!(packed[[0, 0, 2]].abs() < 1e-12, "Im(m=1) should vanish");
        for c in 3..packed.dim().2 {
            assert!(
                packed[[0, 0, c]].abs() < 1e-12,
                "Coefficient {c} should vanish, got {}",
                packed[[0, 0, c]]
            );
        }
    }

    #[test]
    fn test_roundtrip_single_plane_nz() {
        let original = Array3::from_shape_fn((2, 2, 1), |(i, j, _)| (i + j) as f64 * 1.5);
        let packed = transform_z(&original);
        assert_eq!(packed.dim(), (2, 2, 1));
        let recovered = inverse_transform_z(&packed, 1);
        for ((i, j, k), &val) in original.indexed_iter() {
            assert!((recovered[[i, j, k]] - val).abs() < 1e-14);
        }
    }
}
