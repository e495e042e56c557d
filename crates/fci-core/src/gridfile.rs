// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — Grid File
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Writing and reading the persisted grid archive.
//!
//! The on-disk container is a NumPy `.npz` archive, one named array per
//! key. Scalars are single-element arrays: i64 for point counts and
//! separatrix markers, f64 for grid steps. Real-space map storage is
//! bitwise lossless; the spectral representation packs each map along z
//! (see `fci_math::fft`) for consumers that expect Fourier-space maps,
//! and omits the `nz` key because the packed z-length differs from the
//! grid's.

use ndarray::{Array1, Array2, Array3, ArrayBase, Data, Dimension, Ix1, Ix2, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, WritableElement};
use std::fs::File;
use std::path::{Path, PathBuf};

use fci_math::fft::transform_z;
use fci_types::error::{FciError, FciResult};
use fci_types::grid::Grid;

use crate::field::MagneticField;
use crate::maps::FciMaps;

/// How the four maps are laid out in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapRepresentation {
    /// Real-space maps, shape (nx, ny, nz); `nz` is recorded.
    RealSpace,
    /// Maps packed spectrally along z; `nz` is omitted.
    Spectral,
}

/// Serialize grid metadata, derived field arrays and the four FCI maps.
///
/// The archive is assembled at a `.partial` sibling path and renamed
/// into place once complete, so `path` never holds a truncated file.
pub fn write_grid<F, P>(
    grid: &Grid,
    field: &F,
    maps: &FciMaps,
    path: P,
    representation: MapRepresentation,
) -> FciResult<()>
where
    F: MagneticField + ?Sized,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);
    if maps.dim() != (nx, ny, nz) {
        return Err(FciError::Config(format!(
            "maps shape {:?} does not match grid ({nx}, {ny}, {nz})",
            maps.dim()
        )));
    }

    let tmp = partial_path(path);
    let result = write_archive(grid, field, maps, &tmp, representation);
    if result.is_err() {
        std::fs::remove_file(&tmp).ok();
        return result;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn write_archive<F>(
    grid: &Grid,
    field: &F,
    maps: &FciMaps,
    tmp: &Path,
    representation: MapRepresentation,
) -> FciResult<()>
where
    F: MagneticField + ?Sized,
{
    let (nx, ny, nz) = (grid.nx, grid.ny, grid.nz);

    let bx = Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| {
        field.bx(grid.x[i], grid.z[k], grid.y[j])
    });
    let bz = Array3::from_shape_fn((nx, ny, nz), |(i, j, k)| {
        field.bz(grid.x[i], grid.z[k], grid.y[j])
    });
    // Poloidal magnitude on the first z-slice.
    let bxy = Array2::from_shape_fn((nx, ny), |(i, j)| {
        field.magnitude(grid.x[i], grid.z[0], grid.y[j])
    });
    let g_22 = Array2::from_elem((nx, ny), 1.0 / (grid.rmaj * grid.rmaj));
    // nx + 1 marks "no internal radial boundary" to downstream solvers.
    let ixseps = (nx + 1) as i64;

    let file = File::create(tmp)?;
    let mut npz = NpzWriter::new(file);

    add_array(&mut npz, "nx", &scalar_i64(nx as i64))?;
    add_array(&mut npz, "ny", &scalar_i64(ny as i64))?;
    if representation == MapRepresentation::RealSpace {
        add_array(&mut npz, "nz", &scalar_i64(nz as i64))?;
    }
    add_array(&mut npz, "dx", &scalar_f64(grid.delta_x))?;
    add_array(&mut npz, "dy", &scalar_f64(grid.delta_y))?;
    add_array(&mut npz, "ixseps1", &scalar_i64(ixseps))?;
    add_array(&mut npz, "ixseps2", &scalar_i64(ixseps))?;
    add_array(&mut npz, "g_22", &g_22)?;
    add_array(&mut npz, "Bxy", &bxy)?;
    add_array(&mut npz, "bx", &bx)?;
    add_array(&mut npz, "bz", &bz)?;

    let map_entries = [
        ("forward_xt_prime", &maps.forward_xt_prime),
        ("forward_zt_prime", &maps.forward_zt_prime),
        ("backward_xt_prime", &maps.backward_xt_prime),
        ("backward_zt_prime", &maps.backward_zt_prime),
    ];
    for (key, map) in map_entries {
        match representation {
            MapRepresentation::RealSpace => add_array(&mut npz, key, map)?,
            MapRepresentation::Spectral => add_array(&mut npz, key, &transform_z(map))?,
        }
    }

    npz.finish()
        .map_err(|e| FciError::GridFile(format!("failed to finalize archive: {e}")))?;
    Ok(())
}

fn scalar_i64(value: i64) -> Array1<i64> {
    Array1::from_vec(vec![value])
}

fn scalar_f64(value: f64) -> Array1<f64> {
    Array1::from_vec(vec![value])
}

fn add_array<S, D>(
    npz: &mut NpzWriter<File>,
    key: &str,
    array: &ArrayBase<S, D>,
) -> FciResult<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    npz.add_array(key, array)
        .map_err(|e| FciError::GridFile(format!("failed to write {key}: {e}")))
}

fn partial_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".partial");
    PathBuf::from(os)
}

/// Typed read access to a grid archive.
///
/// Lookups accept both naming conventions found in the wild: entries
/// stored as `key.npy` (numpy's savez) and bare `key`.
pub struct GridFileReader {
    npz: NpzReader<File>,
}

impl GridFileReader {
    pub fn open<P: AsRef<Path>>(path: P) -> FciResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let npz = NpzReader::new(file)
            .map_err(|e| FciError::GridFile(format!("failed to open {}: {e}", path.display())))?;
        Ok(GridFileReader { npz })
    }

    /// Archive keys with any `.npy` suffix stripped.
    pub fn keys(&mut self) -> FciResult<Vec<String>> {
        let names = self
            .npz
            .names()
            .map_err(|e| FciError::GridFile(format!("failed to list archive keys: {e}")))?;
        Ok(names
            .into_iter()
            .map(|n| n.trim_end_matches(".npy").to_string())
            .collect())
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.keys()
            .map(|keys| keys.iter().any(|k| k == key))
            .unwrap_or(false)
    }

    pub fn scalar_i64(&mut self, key: &str) -> FciResult<i64> {
        let arr = self
            .npz
            .by_name::<OwnedRepr<i64>, Ix1>(&format!("{key}.npy"))
            .or_else(|_| self.npz.by_name::<OwnedRepr<i64>, Ix1>(key))
            .map_err(|e| FciError::GridFile(format!("failed to read {key}: {e}")))?;
        scalar_from(arr, key)
    }

    pub fn scalar_f64(&mut self, key: &str) -> FciResult<f64> {
        let arr = self
            .npz
            .by_name::<OwnedRepr<f64>, Ix1>(&format!("{key}.npy"))
            .or_else(|_| self.npz.by_name::<OwnedRepr<f64>, Ix1>(key))
            .map_err(|e| FciError::GridFile(format!("failed to read {key}: {e}")))?;
        scalar_from(arr, key)
    }

    pub fn array2(&mut self, key: &str) -> FciResult<Array2<f64>> {
        self.npz
            .by_name::<OwnedRepr<f64>, Ix2>(&format!("{key}.npy"))
            .or_else(|_| self.npz.by_name::<OwnedRepr<f64>, Ix2>(key))
            .map_err(|e| FciError::GridFile(format!("failed to read {key}: {e}")))
    }

    pub fn array3(&mut self, key: &str) -> FciResult<Array3<f64>> {
        self.npz
            .by_name::<OwnedRepr<f64>, Ix3>(&format!("{key}.npy"))
            .or_else(|_| self.npz.by_name::<OwnedRepr<f64>, Ix3>(key))
            .map_err(|e| FciError::GridFile(format!("failed to read {key}: {e}")))
    }
}

fn scalar_from<T: Copy>(arr: Array1<T>, key: &str) -> FciResult<T> {
    if arr.is_empty() {
        return Err(FciError::GridFile(format!("{key} holds an empty array")));
    }
    Ok(arr[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ShearedSlab, UniformField};
    use crate::maps::build_maps;
    use fci_math::fft::{inverse_transform_z, packed_len};

    fn temp_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "fci_gridfile_{tag}_{}_{nanos}.npz",
            std::process::id()
        ))
    }

    #[test]
    fn test_real_space_roundtrip_is_lossless() {
        let grid = Grid::new(4, 3, 5, 0.1, 1.0, 1.0, 2.0).unwrap();
        let field = ShearedSlab::new(1.0, 0.1, 1.0, 0.05);
        let maps = build_maps(&grid, &field, None).unwrap();
        let path = temp_path("roundtrip");

        write_grid(&grid, &field, &maps, &path, MapRepresentation::RealSpace).unwrap();

        let mut reader = GridFileReader::open(&path).unwrap();
        assert_eq!(reader.scalar_i64("nx").unwrap(), 4);
        assert_eq!(reader.scalar_i64("ny").unwrap(), 3);
        assert_eq!(reader.scalar_i64("nz").unwrap(), 5);
        assert_eq!(reader.scalar_i64("ixseps1").unwrap(), 5);
        assert_eq!(reader.scalar_i64("ixseps2").unwrap(), 5);
        assert_eq!(reader.scalar_f64("dx").unwrap(), grid.delta_x);
        assert_eq!(reader.scalar_f64("dy").unwrap(), grid.delta_y);

        let g_22 = reader.array2("g_22").unwrap();
        assert_eq!(g_22.dim(), (4, 3));
        assert!((g_22[[0, 0]] - 0.25).abs() < 1e-15, "1/rmaj^2: {}", g_22[[0, 0]]);

        let bxy = reader.array2("Bxy").unwrap();
        for i in 0..4 {
            let expected = field.magnitude(grid.x[i], grid.z[0], grid.y[0]);
            assert!(
                (bxy[[i, 0]] - expected).abs() < 1e-15,
                "Bxy[{i}, 0] = {}, expected {expected}",
                bxy[[i, 0]]
            );
        }

        let bz = reader.array3("bz").unwrap();
        assert_eq!(bz.dim(), (4, 3, 5));
        assert!((bz[[2, 1, 3]] - field.bz(grid.x[2], grid.z[3], grid.y[1])).abs() < 1e-15);

        // Map read-back must be bitwise identical.
        assert_eq!(reader.array3("forward_xt_prime").unwrap(), maps.forward_xt_prime);
        assert_eq!(reader.array3("forward_zt_prime").unwrap(), maps.forward_zt_prime);
        assert_eq!(reader.array3("backward_xt_prime").unwrap(), maps.backward_xt_prime);
        assert_eq!(reader.array3("backward_zt_prime").unwrap(), maps.backward_zt_prime);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_real_space_key_inventory() {
        let grid = Grid::new(3, 2, 4, 0.1, 1.0, 1.0, 1.0).unwrap();
        let field = UniformField::new(1.0);
        let maps = build_maps(&grid, &field, None).unwrap();
        let path = temp_path("keys");

        write_grid(&grid, &field, &maps, &path, MapRepresentation::RealSpace).unwrap();

        let mut reader = GridFileReader::open(&path).unwrap();
        let mut keys = reader.keys().unwrap();
        keys.sort();
        let mut expected: Vec<String> = [
            "nx", "ny", "nz", "dx", "dy", "ixseps1", "ixseps2", "g_22", "Bxy", "bx", "bz",
            "forward_xt_prime", "forward_zt_prime", "backward_xt_prime", "backward_zt_prime",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        expected.sort();
        assert_eq!(keys, expected);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_spectral_write_omits_nz_and_packs_maps() {
        let grid = Grid::new(4, 3, 8, 0.1, 1.0, 1.0, 1.0).unwrap();
        let field = ShearedSlab::new(1.0, 0.1, 1.0, 0.05);
        let maps = build_maps(&grid, &field, None).unwrap();
        let path = temp_path("spectral");

        write_grid(&grid, &field, &maps, &path, MapRepresentation::Spectral).unwrap();

        let mut reader = GridFileReader::open(&path).unwrap();
        assert!(!reader.contains("nz"), "Spectral archives must omit nz");
        let mut keys = reader.keys().unwrap();
        keys.sort();
        let mut expected: Vec<String> = [
            "nx", "ny", "dx", "dy", "ixseps1", "ixseps2", "g_22", "Bxy", "bx", "bz",
            "forward_xt_prime", "forward_zt_prime", "backward_xt_prime", "backward_zt_prime",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        expected.sort();
        assert_eq!(keys, expected);

        let packed = reader.array3("forward_xt_prime").unwrap();
        assert_eq!(packed.dim(), (4, 3, packed_len(8)));
        let recovered = inverse_transform_z(&packed, 8);
        for ((idx, &orig), &rec) in maps
            .forward_xt_prime
            .indexed_iter()
            .zip(recovered.iter())
        {
            assert!(
                (orig - rec).abs() < 1e-10,
                "Spectral roundtrip at {:?}: {} vs {}",
                idx,
                rec,
                orig
            );
        }

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_mismatched_maps_rejected_without_writing() {
        let grid = Grid::new(4, 3, 4, 0.1, 1.0, 1.0, 1.0).unwrap();
        let other = Grid::new(5, 3, 4, 0.1, 1.0, 1.0, 1.0).unwrap();
        let field = UniformField::new(1.0);
        let maps = build_maps(&other, &field, None).unwrap();
        let path = temp_path("mismatch");

        let result = write_grid(&grid, &field, &maps, &path, MapRepresentation::RealSpace);
        assert!(matches!(result, Err(FciError::Config(_))));
        assert!(!path.exists(), "No file should appear after a rejected write");
    }

    #[test]
    fn test_failed_write_leaves_no_file_behind() {
        let grid = Grid::new(3, 2, 3, 0.1, 1.0, 1.0, 1.0).unwrap();
        let field = UniformField::new(1.0);
        let maps = build_maps(&grid, &field, None).unwrap();
        let path = std::env::temp_dir()
            .join("fci_gridfile_missing_dir")
            .join("grid.npz");

        let result = write_grid(&grid, &field, &maps, &path, MapRepresentation::RealSpace);
        assert!(matches!(result, Err(FciError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_reader_reports_missing_keys() {
        let grid = Grid::new(3, 2, 3, 0.1, 1.0, 1.0, 1.0).unwrap();
        let field = UniformField::new(1.0);
        let maps = build_maps(&grid, &field, None).unwrap();
        let path = temp_path("missing_key");

        write_grid(&grid, &field, &maps, &path, MapRepresentation::RealSpace).unwrap();

        let mut reader = GridFileReader::open(&path).unwrap();
        assert!(!reader.contains("psi"));
        assert!(matches!(
            reader.scalar_i64("psi"),
            Err(FciError::GridFile(_))
        ));

        std::fs::remove_file(&path).ok();
    }
}
