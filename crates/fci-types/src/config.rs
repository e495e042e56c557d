// ─────────────────────────────────────────────────────────────────────
// SCPN FCI Grid — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{FciError, FciResult};
use crate::grid::Grid;

/// Top-level generator configuration.
/// Maps 1:1 to slab_config.json schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FciConfig {
    pub name: String,
    pub grid: GridConfig,
    pub field: FieldConfig,
    #[serde(default)]
    pub tracer: TracerConfig,
}

/// Grid point counts and domain lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Point counts [nx, ny, nz].
    pub shape: [usize; 3],
    /// x extent (default 0.1).
    #[serde(default = "default_lx")]
    pub lx: f64,
    /// Toroidal extent in angle (default 10.0).
    #[serde(default = "default_ly")]
    pub ly: f64,
    /// z extent (default 1.0).
    #[serde(default = "default_lz")]
    pub lz: f64,
    /// Major radius entering the g_22 metric term (default 1.0).
    #[serde(default = "default_rmaj")]
    pub rmaj: f64,
}

/// Analytic field selector. Runtime field values live in the core crate;
/// this enum is the serialized description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldConfig {
    /// Purely toroidal field: field lines stay at their starting (x, z).
    Uniform {
        #[serde(default = "default_bt")]
        bt: f64,
    },
    /// Sheared slab: Bz varies linearly with x about the slab centre.
    ShearedSlab {
        #[serde(default = "default_bt")]
        bt: f64,
        #[serde(default = "default_bp")]
        bp: f64,
        #[serde(default = "default_bp_prime")]
        bp_prime: f64,
        #[serde(default)]
        x_centre: f64,
    },
}

/// Settings for the fixed-step reference tracer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TracerConfig {
    /// RK4 substeps per traced toroidal interval (default 16).
    #[serde(default = "default_substeps")]
    pub substeps: usize,
}

fn default_lx() -> f64 {
    0.1
}
fn default_ly() -> f64 {
    10.0
}
fn default_lz() -> f64 {
    1.0
}
fn default_rmaj() -> f64 {
    1.0
}
fn default_bt() -> f64 {
    1.0
}
fn default_bp() -> f64 {
    0.1
}
fn default_bp_prime() -> f64 {
    1.0
}
fn default_substeps() -> usize {
    16
}

impl Default for TracerConfig {
    fn default() -> Self {
        TracerConfig {
            substeps: default_substeps(),
        }
    }
}

impl FciConfig {
    /// Load from JSON file.
    pub fn from_file(path: &str) -> FciResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Check every section, so errors surface before any tracing starts.
    pub fn validate(&self) -> FciResult<()> {
        self.grid.create_grid()?;
        self.field.validate()?;
        self.tracer.validate()
    }
}

impl GridConfig {
    /// Create the runtime `Grid` from this config's shape and lengths.
    pub fn create_grid(&self) -> FciResult<Grid> {
        Grid::new(
            self.shape[0],
            self.shape[1],
            self.shape[2],
            self.lx,
            self.ly,
            self.lz,
            self.rmaj,
        )
    }
}

impl FieldConfig {
    pub fn validate(&self) -> FciResult<()> {
        fn finite(name: &str, value: f64) -> FciResult<()> {
            if !value.is_finite() {
                return Err(FciError::Config(format!(
                    "field parameter {name} must be finite, got {value}"
                )));
            }
            Ok(())
        }

        match self {
            FieldConfig::Uniform { bt } => finite("bt", *bt)?,
            FieldConfig::ShearedSlab {
                bt,
                bp,
                bp_prime,
                x_centre,
            } => {
                finite("bt", *bt)?;
                finite("bp", *bp)?;
                finite("bp_prime", *bp_prime)?;
                finite("x_centre", *x_centre)?;
            }
        }

        // A vanishing toroidal component makes dx/dy and dz/dy singular.
        let bt = match self {
            FieldConfig::Uniform { bt } | FieldConfig::ShearedSlab { bt, .. } => *bt,
        };
        if bt == 0.0 {
            return Err(FciError::Config(
                "field parameter bt must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl TracerConfig {
    pub fn validate(&self) -> FciResult<()> {
        if self.substeps == 0 {
            return Err(FciError::Config(
                "tracer substeps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
