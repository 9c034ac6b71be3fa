//! ESRI world files (`.tfw`, `.wld`)
//!
//! Six lines: pixel width, row rotation, column rotation, pixel height and
//! the x/y of the centre of the upper-left pixel.

use crate::error::{Error, Result};
use crate::raster::GeoTransform;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Sidecar world file path for a raster: `.tif`/`.tiff` → `.tfw`, anything else → `.wld`
pub fn world_file_path(raster_path: &Path) -> PathBuf {
    let ext = raster_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("tif") | Some("tiff") => raster_path.with_extension("tfw"),
        _ => raster_path.with_extension("wld"),
    }
}

/// Write the world file for `transform` to `path`
pub fn write_world_file(transform: &GeoTransform, path: &Path) -> Result<()> {
    let mut text = String::new();
    for value in transform.to_world_file() {
        // Infallible for String
        let _ = writeln!(text, "{:.10}", value);
    }
    fs::write(path, text)?;
    Ok(())
}

/// Read a world file into a GeoTransform
pub fn read_world_file(path: &Path) -> Result<GeoTransform> {
    let text = fs::read_to_string(path)?;
    let values: Vec<f64> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse::<f64>()
                .map_err(|e| Error::Other(format!("Bad world file line '{}': {}", l, e)))
        })
        .collect::<Result<_>>()?;

    let lines: [f64; 6] = values.try_into().map_err(|v: Vec<f64>| {
        Error::Other(format!(
            "World file {} has {} values, expected 6",
            path.display(),
            v.len()
        ))
    })?;

    Ok(GeoTransform::from_world_file(lines))
}
