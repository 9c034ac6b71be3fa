//! `run.json`: what a run did

use crate::error::{PipelineError, Result};
use crate::params::FlattenParams;
use crate::stage::Stage;
use lakeflat_algorithms::statistics::SampleStatistics;
use lakeflat_core::raster::PixelType;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Result for one lake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LakeReport {
    /// Split key (attribute value, feature id or `lake_<n>`)
    pub key: String,
    /// File-safe name used for the lake's intermediate files
    pub name: String,
    /// Elevation written into the lake
    pub elevation: f64,
    /// Number of cells set to the elevation
    pub cells: usize,
    /// Samples the elevation was computed from (none for a fixed elevation)
    pub statistics: Option<SampleStatistics>,
    /// Number of input features merged into this lake
    pub merged_features: usize,
}

/// Wall time spent in a stage; per-lake stages are summed over all lakes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub params: FlattenParams,
    /// Local start time, `YYYY-MM-DD HH:MM:SS`
    pub started: String,
    pub finished: String,
    pub work_dir: PathBuf,
    pub output: PathBuf,
    /// Sample type of the output
    pub pixel_type: PixelType,
    pub lakes: Vec<LakeReport>,
    /// Cells covered by more than one lake
    pub overlapping_cells: usize,
    pub stages: Vec<StageTiming>,
}

impl RunManifest {
    /// Write as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}
