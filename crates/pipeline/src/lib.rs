//! # lakeflat pipeline
//!
//! Runs the full lake-flattening workflow over files on disk:
//!
//! 1. split the lake layer into one layer per lake
//! 2. fill the sinks of the DEM
//! 3. per lake: clip the DEM, estimate an elevation, rasterize it
//! 4. merge the lake rasters and polygonize their footprint
//! 5. cut the lakes out of the area of interest and clip the DEM to the rest
//! 6. mosaic both parts and export the final GeoTIFF with a world file
//!
//! Every intermediate product is written to a timestamped working directory,
//! together with a `run.json` manifest.
//!
//! ```ignore
//! use lakeflat_pipeline::{FlattenParams, Pipeline};
//!
//! let params = FlattenParams {
//!     dem: "dem.tif".into(),
//!     lakes: "lakes.geojson".into(),
//!     aoi: "aoi.geojson".into(),
//!     output: "flat.tif".into(),
//!     ..Default::default()
//! };
//! let report = Pipeline::new(params).run()?;
//! println!("{} lakes flattened", report.lakes.len());
//! ```

mod error;
mod manifest;
mod params;
mod pipeline;
mod stage;
mod workdir;

pub use error::{PipelineError, Result};
pub use manifest::{LakeReport, RunManifest, StageTiming};
pub use params::FlattenParams;
pub use pipeline::{Pipeline, RunReport};
pub use stage::Stage;
pub use workdir::WorkDir;

pub use lakeflat_algorithms::lakes::ElevationPolicy;
