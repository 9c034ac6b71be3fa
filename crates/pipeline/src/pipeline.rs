//! Stage-by-stage execution of a flattening run

use crate::error::{PipelineError, Result};
use crate::manifest::{LakeReport, RunManifest, StageTiming};
use crate::params::FlattenParams;
use crate::stage::Stage;
use crate::workdir::WorkDir;
use chrono::{Local, NaiveDateTime};
use geo::Point;
use lakeflat_algorithms::hydrology::fill_sinks;
use lakeflat_algorithms::lakes::{ElevationEstimate, ElevationPolicy};
use lakeflat_algorithms::masking::{clip_by_polygon, constant_like};
use lakeflat_algorithms::mosaic::mosaic;
use lakeflat_algorithms::statistics::SampleStatistics;
use lakeflat_algorithms::vector::{difference, polygonize, split_by_field, LayerPart};
use lakeflat_core::io::{read_features, read_geotiff_typed, world_file_path, write_features, write_geotiff, write_world_file, GeoTiffOptions};
use lakeflat_core::vector::{AttributeValue, Feature, FeatureCollection};
use lakeflat_core::raster::PixelType;
use lakeflat_core::{Error, Raster, CRS};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Working directory (already deleted when `purged`)
    pub work_dir: PathBuf,
    pub output: PathBuf,
    /// Sample type the output was written with
    pub pixel_type: PixelType,
    /// One entry per lake, in processing order
    pub lakes: Vec<LakeReport>,
    pub overlapping_cells: usize,
    pub purged: bool,
}

/// Lake flattening pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: FlattenParams,
}

impl Pipeline {
    pub fn new(params: FlattenParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FlattenParams {
        &self.params
    }

    /// Run with the working directory stamped with the current local time
    pub fn run(&self) -> Result<RunReport> {
        self.run_at(Local::now().naive_local())
    }

    /// Run with the working directory stamped with `at`.
    ///
    /// Stages run strictly in order. The first failure aborts the run with
    /// the failing stage; files written so far are left in place.
    pub fn run_at(&self, at: NaiveDateTime) -> Result<RunReport> {
        let p = &self.params;
        let mut clock = StageClock::default();

        let (dem, input_type, lakes, aoi, work) = clock.run(Stage::Init, || {
            p.validate()?;
            let (dem, input_type) = read_geotiff_typed::<f64, _>(&p.dem)?;
            let lakes = read_features(&p.lakes)?;
            let aoi = read_features(&p.aoi)?;
            check_crs(dem.crs(), lakes.crs.as_ref())?;
            check_crs(dem.crs(), aoi.crs.as_ref())?;

            let work = WorkDir::create(&p.work_dir, p.policy.working_dir_prefix(), at)?;
            info!("DEM: {} x {} {} ({})", dem.cols(), dem.rows(), input_type, p.dem.display());
            info!("Policy: {}", p.policy);
            info!("Working directory: {}", work.path().display());
            Ok((dem, input_type, lakes, aoi, work))
        })?;

        let parts = clock.run(Stage::SplitLakes, || {
            let parts = split_by_field(&lakes, p.field.as_deref())?;
            for part in &parts {
                if part.source_features > 1 {
                    warn!(
                        "{} features share the key '{}' and are merged into one lake",
                        part.source_features, part.key
                    );
                }
                write_features(&part.layer, work.lake_layer(&part.name))?;
            }
            info!("Lakes: {}", parts.len());
            Ok(parts)
        })?;

        let filled_path = work.filled_dem();
        let filled = clock.run(Stage::FillSinks, move || {
            let filled = if p.fill_sinks {
                fill_sinks(&dem, p.fill)?
            } else {
                debug!("Sink filling disabled");
                dem
            };
            write_geotiff(&filled, &filled_path, None)?;
            Ok(filled)
        })?;

        let mut lake_rasters = Vec::with_capacity(parts.len());
        let mut reports = Vec::with_capacity(parts.len());
        for part in &parts {
            let (flat, report) = self.process_lake(&mut clock, &work, &filled, part)?;
            info!(
                "Lake '{}': elevation {:.3} over {} cells",
                report.key, report.elevation, report.cells
            );
            lake_rasters.push(flat);
            reports.push(report);
        }

        let merged = clock.run(Stage::MergeLakeRasters, || {
            let sources: Vec<&Raster<f64>> = lake_rasters.iter().collect();
            let merged = mosaic(&sources)?;
            if merged.overlapping_cells > 0 {
                warn!(
                    "{} cells are covered by more than one lake; the later lake wins",
                    merged.overlapping_cells
                );
            }
            write_geotiff(&merged.raster, work.merged_lakes(), None)?;
            Ok(merged)
        })?;
        drop(lake_rasters);
        let overlapping_cells = merged.overlapping_cells;
        let merged = merged.raster;

        let footprint = clock.run(Stage::Polygonize, || {
            let footprint = polygonize(&merged)?;
            debug!("Lake footprint: {} polygons", footprint.len());
            write_features(&footprint, work.merged_polygons())?;
            Ok(footprint)
        })?;

        let rest = clock.run(Stage::DifferenceAoi, || {
            let rest = difference(&aoi, &footprint);
            write_features(&rest, work.difference())?;
            Ok(rest)
        })?;

        let non_lake = clock.run(Stage::ClipNonLake, || {
            let mask = rest.to_multi_polygon();
            if mask.0.is_empty() {
                warn!("Lakes cover the whole area of interest");
                return Ok(None);
            }
            let clipped = clip_by_polygon(&filled, &mask)?;
            write_geotiff(&clipped, work.non_lake_dem(), None)?;
            Ok(Some(clipped))
        })?;

        let final_dem = clock.run(Stage::FinalMosaic, || {
            let mut sources = Vec::with_capacity(2);
            sources.extend(non_lake.as_ref());
            sources.push(&merged);
            let final_dem = mosaic(&sources)?.raster;
            write_geotiff(&final_dem, work.final_dem(), None)?;
            Ok(final_dem)
        })?;

        let pixel_type = p.pixel_type.unwrap_or(input_type);
        clock.run(Stage::Export, || {
            if let Some(parent) = p.output.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let options = GeoTiffOptions { pixel_type };
            write_geotiff(&final_dem, &p.output, Some(options))?;
            write_world_file(final_dem.transform(), &world_file_path(&p.output))?;
            info!("Output: {} ({})", p.output.display(), pixel_type);
            Ok(())
        })?;

        let manifest = RunManifest {
            params: p.clone(),
            started: at.format("%Y-%m-%d %H:%M:%S").to_string(),
            finished: Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string(),
            work_dir: work.path().to_path_buf(),
            output: p.output.clone(),
            pixel_type,
            lakes: reports,
            overlapping_cells,
            stages: clock.into_timings(),
        };
        manifest.write(&work.manifest())?;

        let work_dir = work.path().to_path_buf();
        let purged = !p.keep_intermediates;
        if purged {
            debug!("Removing {}", work_dir.display());
            work.purge().map_err(|source| PipelineError::Io {
                path: work_dir.clone(),
                source,
            })?;
        }
        debug!("{}", Stage::Done);

        Ok(RunReport {
            work_dir,
            output: manifest.output,
            pixel_type,
            lakes: manifest.lakes,
            overlapping_cells,
            purged,
        })
    }

    /// CLIP, ESTIMATE and RASTERIZE for one lake
    fn process_lake(
        &self,
        clock: &mut StageClock,
        work: &WorkDir,
        filled: &Raster<f64>,
        part: &LayerPart,
    ) -> Result<(Raster<f64>, LakeReport)> {
        let policy = self.params.policy;
        let polygons = part.polygons();

        let clipped = clock.run(Stage::Clip, || {
            let clipped = clip_by_polygon(filled, &polygons)?;
            write_geotiff(&clipped, work.lake_dem(&part.name), None)?;
            Ok(clipped)
        })?;

        let estimate = clock.run(Stage::Estimate, || {
            let estimate = policy.estimate(&part.key, filled, &clipped, &polygons)?;
            write_estimate(work, part, policy, &estimate)?;
            Ok(estimate)
        })?;

        let flat = clock.run(Stage::Rasterize, || {
            let flat = constant_like(&clipped, estimate.elevation)?;
            write_geotiff(&flat, work.lake_flat(&part.name), None)?;
            Ok(flat)
        })?;

        let report = LakeReport {
            key: part.key.clone(),
            name: part.name.clone(),
            elevation: estimate.elevation,
            cells: flat.valid_count(),
            statistics: estimate.statistics,
            merged_features: part.source_features,
        };
        Ok((flat, report))
    }
}

/// Accumulates wall time per stage and tags failures with their stage
#[derive(Debug, Default)]
struct StageClock {
    timings: Vec<StageTiming>,
}

impl StageClock {
    fn run<T>(&mut self, stage: Stage, f: impl FnOnce() -> lakeflat_core::Result<T>) -> Result<T> {
        if !stage.is_per_lake() {
            debug!("{}", stage);
        }
        let start = Instant::now();
        let result = f();
        let seconds = start.elapsed().as_secs_f64();

        match self.timings.iter_mut().find(|t| t.stage == stage) {
            Some(timing) => timing.seconds += seconds,
            None => self.timings.push(StageTiming { stage, seconds }),
        }
        result.map_err(|source| PipelineError::Stage { stage, source })
    }

    fn into_timings(self) -> Vec<StageTiming> {
        self.timings
    }
}

/// Fail when both CRSs are known and differ
fn check_crs(raster: Option<&CRS>, layer: Option<&CRS>) -> lakeflat_core::Result<()> {
    match (raster, layer) {
        (Some(a), Some(b)) if !a.is_equivalent(b) => {
            Err(Error::CrsMismatch(a.identifier(), b.identifier()))
        }
        _ => Ok(()),
    }
}

#[derive(Serialize)]
struct LakeStatistics<'a> {
    lake: &'a str,
    policy: ElevationPolicy,
    elevation: f64,
    statistics: Option<SampleStatistics>,
}

/// Write the statistics of a lake, plus its outline and boundary samples
/// when the elevation came from the boundary
fn write_estimate(
    work: &WorkDir,
    part: &LayerPart,
    policy: ElevationPolicy,
    estimate: &ElevationEstimate,
) -> lakeflat_core::Result<()> {
    let crs = part.layer.crs.clone();

    if let Some(outline) = &estimate.outline {
        let line = FeatureCollection::from_iter([Feature::new(outline.clone())
            .with_property("lake", AttributeValue::String(part.key.clone()))])
        .with_crs(crs.clone());
        write_features(&line, work.lake_line(&part.name))?;

        let points = estimate
            .profile
            .iter()
            .map(|pt| {
                Feature::new(Point::new(pt.x, pt.y))
                    .with_property("line", AttributeValue::Int(pt.line as i64))
                    .with_property("distance", AttributeValue::Float(pt.distance))
                    .with_property("Z", AttributeValue::Float(pt.z))
            })
            .collect::<FeatureCollection>()
            .with_crs(crs);
        write_features(&points, work.lake_points(&part.name))?;
    }

    let stats = LakeStatistics {
        lake: &part.key,
        policy,
        elevation: estimate.elevation,
        statistics: estimate.statistics,
    };
    let text = serde_json::to_string_pretty(&stats).map_err(|e| Error::Other(e.to_string()))?;
    fs::write(work.lake_stats(&part.name), text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_check_skips_unknown() {
        let utm = CRS::from_epsg(32634);
        assert!(check_crs(None, Some(&utm)).is_ok());
        assert!(check_crs(Some(&utm), None).is_ok());
        assert!(check_crs(Some(&utm), Some(&CRS::from_epsg(32634))).is_ok());

        let err = check_crs(Some(&utm), Some(&CRS::from_epsg(4326))).unwrap_err();
        assert!(matches!(err, Error::CrsMismatch(..)));
    }

    #[test]
    fn test_clock_sums_repeated_stages() {
        let mut clock = StageClock::default();
        clock.run(Stage::Clip, || Ok(())).unwrap();
        clock.run(Stage::Clip, || Ok(())).unwrap();
        clock.run(Stage::Estimate, || Ok(())).unwrap();

        let err = clock
            .run::<()>(Stage::Rasterize, || Err(Error::Other("boom".into())))
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Rasterize));

        let stages: Vec<Stage> = clock.into_timings().into_iter().map(|t| t.stage).collect();
        assert_eq!(stages, [Stage::Clip, Stage::Estimate, Stage::Rasterize]);
    }
}
