//! Working directory of a run and the names of its files

use chrono::NaiveDateTime;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Timestamped directory holding the intermediate products of one run
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Create `<base>/<prefix>-<YYYY-MM-DD>-<HHMMSS>`.
    ///
    /// When that directory already exists, `-1`, `-2`, ... is appended until
    /// a fresh name is found. `base` is created if needed.
    pub fn create(base: &Path, prefix: &str, at: NaiveDateTime) -> io::Result<Self> {
        fs::create_dir_all(base)?;

        let stem = format!("{}-{}", prefix, at.format("%Y-%m-%d-%H%M%S"));
        let mut candidate = base.join(&stem);
        let mut suffix = 0;
        loop {
            match fs::create_dir(&candidate) {
                Ok(()) => return Ok(Self { root: candidate }),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    suffix += 1;
                    candidate = base.join(format!("{}-{}", stem, suffix));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    pub fn filled_dem(&self) -> PathBuf {
        self.file("INPUT-DEM-SINKS-FILLED.tif")
    }

    /// Layer of a single lake
    pub fn lake_layer(&self, lake: &str) -> PathBuf {
        self.file(format!("{}.geojson", lake))
    }

    /// DEM clipped to a lake
    pub fn lake_dem(&self, lake: &str) -> PathBuf {
        self.file(format!("{}-DEM.tif", lake))
    }

    pub fn lake_line(&self, lake: &str) -> PathBuf {
        self.file(format!("{}-LINE.geojson", lake))
    }

    pub fn lake_points(&self, lake: &str) -> PathBuf {
        self.file(format!("{}-PROFILED-POINTS.geojson", lake))
    }

    pub fn lake_stats(&self, lake: &str) -> PathBuf {
        self.file(format!("{}-STATS.json", lake))
    }

    /// Lake footprint filled with its elevation
    pub fn lake_flat(&self, lake: &str) -> PathBuf {
        self.file(format!("{}-DEM-MEAN-LAKE-ELEVATION.tif", lake))
    }

    pub fn merged_lakes(&self) -> PathBuf {
        self.file("merged_lake_elevation_files.tif")
    }

    pub fn merged_polygons(&self) -> PathBuf {
        self.file("merged_lake_elevation_files-polygon.geojson")
    }

    pub fn difference(&self) -> PathBuf {
        self.file("difference.geojson")
    }

    pub fn non_lake_dem(&self) -> PathBuf {
        self.file("DEM-NON-LAKES_REGIONS.tif")
    }

    pub fn final_dem(&self) -> PathBuf {
        self.file("FINAL-DEM.tif")
    }

    pub fn manifest(&self) -> PathBuf {
        self.file("run.json")
    }

    /// Delete the directory and everything in it
    pub fn purge(self) -> io::Result<()> {
        fs::remove_dir_all(&self.root)
    }
}
