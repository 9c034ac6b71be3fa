//! Parameters of a flattening run

use lakeflat_algorithms::hydrology::FillSinksParams;
use lakeflat_algorithms::lakes::ElevationPolicy;
use lakeflat_core::raster::PixelType;
use lakeflat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inputs, outputs and options of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenParams {
    /// Input DEM (GeoTIFF)
    pub dem: PathBuf,
    /// Lake polygons (GeoJSON)
    pub lakes: PathBuf,
    /// Area of interest polygons (GeoJSON)
    pub aoi: PathBuf,
    /// Directory in which the timestamped working directory is created
    pub work_dir: PathBuf,
    /// Final GeoTIFF; a world file is written beside it
    pub output: PathBuf,
    pub policy: ElevationPolicy,
    /// Attribute identifying lakes. `None`: one lake per feature
    pub field: Option<String>,
    /// Fill sinks before estimating elevations
    pub fill_sinks: bool,
    pub fill: FillSinksParams,
    /// Sample type of the exported raster. `None`: the input DEM's type
    pub pixel_type: Option<PixelType>,
    /// Keep the working directory after a successful run
    pub keep_intermediates: bool,
}

impl Default for FlattenParams {
    fn default() -> Self {
        Self {
            dem: PathBuf::new(),
            lakes: PathBuf::new(),
            aoi: PathBuf::new(),
            work_dir: PathBuf::from("."),
            output: PathBuf::from("FINAL-DEM.tif"),
            policy: ElevationPolicy::default(),
            field: None,
            fill_sinks: true,
            fill: FillSinksParams::default(),
            pixel_type: None,
            keep_intermediates: true,
        }
    }
}

impl FlattenParams {
    /// Check the parameters before anything is read or written
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [("dem", &self.dem), ("lakes", &self.lakes), ("aoi", &self.aoi), ("output", &self.output)] {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidParameter {
                    name,
                    value: String::new(),
                    reason: "path is required".into(),
                });
            }
        }

        if let ElevationPolicy::Fixed(value) = self.policy {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "elevation",
                    value: value.to_string(),
                    reason: "fixed lake elevation must be finite".into(),
                });
            }
        }

        let slope = self.fill.min_slope;
        if !(0.0..90.0).contains(&slope) {
            return Err(Error::InvalidParameter {
                name: "min_slope",
                value: slope.to_string(),
                reason: "must be in [0, 90) degrees".into(),
            });
        }

        if matches!(&self.field, Some(field) if field.trim().is_empty()) {
            return Err(Error::InvalidParameter {
                name: "field",
                value: String::new(),
                reason: "field name is empty".into(),
            });
        }

        Ok(())
    }
}
