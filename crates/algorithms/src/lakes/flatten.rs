//! Flatten one lake: clip, estimate, rasterize

use super::policy::{ElevationEstimate, ElevationPolicy};
use crate::masking::{clip_by_polygon, constant_like};
use geo::MultiPolygon;
use lakeflat_core::raster::Raster;
use lakeflat_core::{Algorithm, Error, Result};

/// Intermediate and final rasters of one flattened lake
#[derive(Debug, Clone)]
pub struct FlattenedLake {
    /// DEM clipped to the lake
    pub clipped: Raster<f64>,
    /// Chosen elevation
    pub estimate: ElevationEstimate,
    /// Clipped grid filled with the chosen elevation
    pub flattened: Raster<f64>,
}

/// Replace the DEM inside `polygons` by one elevation chosen with `policy`.
///
/// `lake` names the lake in errors.
pub fn flatten_lake(
    dem: &Raster<f64>,
    lake: &str,
    polygons: &MultiPolygon<f64>,
    policy: ElevationPolicy,
) -> Result<FlattenedLake> {
    let clipped = clip_by_polygon(dem, polygons)?;
    let estimate = policy.estimate(lake, dem, &clipped, polygons)?;
    let flattened = constant_like(&clipped, estimate.elevation)?;

    Ok(FlattenedLake {
        clipped,
        estimate,
        flattened,
    })
}

/// Lake flattening algorithm
#[derive(Debug, Clone, Default)]
pub struct FlattenLake;

impl Algorithm for FlattenLake {
    type Input = (Raster<f64>, MultiPolygon<f64>);
    type Output = Raster<f64>;
    type Params = ElevationPolicy;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Flatten Lake"
    }

    fn description(&self) -> &'static str {
        "Replace the DEM inside a lake polygon by one representative elevation"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dem, polygons) = input;
        flatten_lake(&dem, "lake", &polygons, params).map(|lake| lake.flattened)
    }
}
