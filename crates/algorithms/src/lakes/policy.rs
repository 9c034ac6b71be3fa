//! Representative lake elevation

use crate::statistics::{profile_along_lines, ProfilePoint, SampleStatistics};
use crate::vector::polygon_outline;
use geo::{MultiLineString, MultiPolygon};
use lakeflat_core::raster::Raster;
use lakeflat_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the elevation of a flattened lake is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElevationPolicy {
    /// Mean of the non-negative DEM cells inside the lake
    InteriorMean,
    /// Mean of DEM samples along the lake outline
    BoundaryMean,
    /// One elevation for every lake
    Fixed(f64),
}

impl Default for ElevationPolicy {
    fn default() -> Self {
        ElevationPolicy::InteriorMean
    }
}

impl ElevationPolicy {
    /// Short name, as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            ElevationPolicy::InteriorMean => "interior-mean",
            ElevationPolicy::BoundaryMean => "boundary-mean",
            ElevationPolicy::Fixed(_) => "fixed",
        }
    }

    /// Prefix of the working directory of a run with this policy
    pub fn working_dir_prefix(&self) -> &'static str {
        match self {
            ElevationPolicy::InteriorMean => "PROCESS_DEM_IN_LAKE_REGIONS",
            ElevationPolicy::BoundaryMean => "PROCESS_DEM_IN_LAKE_REGIONS_USING_BOUNDARY_PIXELS",
            ElevationPolicy::Fixed(_) => "PROCESS_DEM_WITH_1_LAKE_IN_REGION",
        }
    }

    /// Estimate the elevation of one lake.
    ///
    /// `dem` is the full (sink-filled) DEM, `clipped` the DEM clipped to the
    /// lake and `polygons` the lake footprint. `lake` only names the lake in
    /// errors.
    ///
    /// # Errors
    /// * `NoValidElevation` when no interior cell is valid and non-negative
    /// * `NoBoundarySamples` when the outline misses every valid cell
    /// * `InvalidParameter` for a non-finite fixed elevation
    pub fn estimate(
        &self,
        lake: &str,
        dem: &Raster<f64>,
        clipped: &Raster<f64>,
        polygons: &MultiPolygon<f64>,
    ) -> Result<ElevationEstimate> {
        match *self {
            ElevationPolicy::InteriorMean => {
                let cells = clipped
                    .data()
                    .iter()
                    .copied()
                    .filter(|&v| !clipped.is_nodata(v) && v >= 0.0);
                let statistics = SampleStatistics::from_values(cells).ok_or_else(|| {
                    Error::NoValidElevation {
                        lake: lake.to_string(),
                    }
                })?;
                Ok(ElevationEstimate {
                    elevation: statistics.mean,
                    statistics: Some(statistics),
                    outline: None,
                    profile: Vec::new(),
                })
            }
            ElevationPolicy::BoundaryMean => {
                let outline = polygon_outline(polygons);
                let profile = profile_along_lines(dem, &outline);
                let statistics = SampleStatistics::from_values(profile.iter().map(|p| p.z))
                    .ok_or_else(|| Error::NoBoundarySamples {
                        lake: lake.to_string(),
                    })?;
                Ok(ElevationEstimate {
                    elevation: statistics.mean,
                    statistics: Some(statistics),
                    outline: Some(outline),
                    profile,
                })
            }
            ElevationPolicy::Fixed(value) => {
                if !value.is_finite() {
                    return Err(Error::InvalidParameter {
                        name: "elevation",
                        value: value.to_string(),
                        reason: "fixed lake elevation must be finite".into(),
                    });
                }
                Ok(ElevationEstimate {
                    elevation: value,
                    statistics: None,
                    outline: None,
                    profile: Vec::new(),
                })
            }
        }
    }
}

impl fmt::Display for ElevationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElevationPolicy::Fixed(value) => write!(f, "fixed ({})", value),
            other => f.write_str(other.name()),
        }
    }
}

/// Elevation chosen for one lake, with what it was derived from
#[derive(Debug, Clone)]
pub struct ElevationEstimate {
    pub elevation: f64,
    /// Statistics of the samples behind the elevation (none for fixed)
    pub statistics: Option<SampleStatistics>,
    /// Lake outline, for the boundary policy
    pub outline: Option<MultiLineString<f64>>,
    /// Boundary samples, for the boundary policy
    pub profile: Vec<ProfilePoint>,
}
