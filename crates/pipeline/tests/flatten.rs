//! End-to-end runs of the flattening pipeline over small synthetic inputs.

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use lakeflat_algorithms::hydrology::FillSinksParams;
use lakeflat_core::io::{read_geotiff, read_geotiff_typed, world_file_path, write_geotiff, GeoTiffOptions};
use lakeflat_core::raster::PixelType;
use lakeflat_core::{Error, GeoTransform, Raster, CRS};
use lakeflat_pipeline::{ElevationPolicy, FlattenParams, Pipeline, RunManifest, Stage};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 17)
        .and_then(|d| d.and_hms_opt(9, 3, 7))
        .unwrap()
}

/// 10 x 10 DEM at 5 with a 3 x 3 block at 8 (rows/cols 3..6), one cell -1.
/// Cell size 1, top-left corner at (0, 10).
fn scenario_dem() -> Raster<f64> {
    let mut dem = Raster::filled(10, 10, 5.0);
    dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
    dem.set_crs(Some(CRS::from_epsg(32634)));
    for row in 3..6 {
        for col in 3..6 {
            dem.set(row, col, 8.0).unwrap();
        }
    }
    dem.set(4, 4, -1.0).unwrap();
    dem
}

fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> String {
    format!("[[[{x0}, {y0}], [{x1}, {y0}], [{x1}, {y1}], [{x0}, {y1}], [{x0}, {y0}]]]")
}

fn layer(features: &[(String, &str)], crs: Option<&str>) -> String {
    let features: Vec<String> = features
        .iter()
        .map(|(coords, props)| {
            format!(
                r#"{{"type": "Feature", "properties": {props}, "geometry": {{"type": "Polygon", "coordinates": {coords}}}}}"#
            )
        })
        .collect();
    let crs = crs
        .map(|name| format!(r#""crs": {{"type": "name", "properties": {{"name": "{name}"}}}},"#))
        .unwrap_or_default();
    format!(r#"{{"type": "FeatureCollection", {crs} "features": [{}]}}"#, features.join(","))
}

struct Inputs {
    dir: TempDir,
    params: FlattenParams,
}

impl Inputs {
    fn new(dem: &Raster<f64>, lakes: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_geotiff(dem, root.join("dem.tif"), None).unwrap();
        fs::write(root.join("lakes.geojson"), lakes).unwrap();
        fs::write(
            root.join("aoi.geojson"),
            layer(&[(square(0.0, 0.0, 10.0, 10.0), "{}")], Some("EPSG:32634")),
        )
        .unwrap();

        let params = FlattenParams {
            dem: root.join("dem.tif"),
            lakes: root.join("lakes.geojson"),
            aoi: root.join("aoi.geojson"),
            work_dir: root.join("work"),
            output: root.join("out/flat.tif"),
            fill: FillSinksParams { min_slope: 0.0 },
            ..Default::default()
        };
        Self { dir, params }
    }

    fn scenario() -> Self {
        let lakes = layer(
            &[(square(3.0, 4.0, 6.0, 7.0), r#"{"name": "Ohrid"}"#)],
            Some("urn:ogc:def:crs:EPSG::32634"),
        );
        Self::new(&scenario_dem(), &lakes)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }
}

fn in_block(row: usize, col: usize) -> bool {
    (3..6).contains(&row) && (3..6).contains(&col)
}

#[test]
fn test_interior_mean_scenario() {
    let inputs = Inputs::scenario();
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    assert_eq!(report.lakes.len(), 1);
    let lake = &report.lakes[0];
    assert_eq!(lake.key, "lake_1");
    assert_relative_eq!(lake.elevation, 8.0);
    assert_eq!(lake.cells, 9);

    let out: Raster<f64> = read_geotiff(&report.output).unwrap();
    assert_eq!(out.shape(), (10, 10));
    for row in 0..10 {
        for col in 0..10 {
            let expected = if in_block(row, col) { 8.0 } else { 5.0 };
            assert_relative_eq!(out.get(row, col).unwrap(), expected);
        }
    }
    assert!(world_file_path(&report.output).exists());
    assert!(!report.purged);
    assert_eq!(out.transform(), &GeoTransform::new(0.0, 10.0, 1.0, -1.0));
    assert_eq!(out.crs().and_then(|c| c.epsg()), Some(32634));
}

#[test]
fn test_output_keeps_input_pixel_type() {
    let inputs = Inputs::scenario();
    let int_dem = inputs.root().join("dem-int16.tif");
    write_geotiff(&scenario_dem(), &int_dem, Some(GeoTiffOptions { pixel_type: PixelType::Int16 })).unwrap();
    let params = FlattenParams {
        dem: int_dem,
        ..inputs.params.clone()
    };

    let report = Pipeline::new(params).run_at(at()).unwrap();
    assert_eq!(report.pixel_type, PixelType::Int16);

    let (out, pixel_type) = read_geotiff_typed::<f64, _>(&report.output).unwrap();
    assert_eq!(pixel_type, PixelType::Int16);
    assert_eq!(out.get(4, 4).unwrap(), 8.0);
    assert_eq!(out.get(0, 0).unwrap(), 5.0);

    // Float32 input stays Float32
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();
    assert_eq!(report.pixel_type, PixelType::Float32);
}

#[test]
fn test_keys_with_same_file_name_keep_separate_files() {
    let lakes = layer(
        &[
            (square(3.0, 4.0, 6.0, 7.0), r#"{"name": "Lake A"}"#),
            (square(7.0, 1.0, 9.0, 3.0), r#"{"name": "Lake/A"}"#),
        ],
        None,
    );
    let mut inputs = Inputs::new(&scenario_dem(), &lakes);
    inputs.params.field = Some("name".into());
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    let names: Vec<&str> = report.lakes.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["name_Lake_A", "name_Lake_A-1"]);
    for name in names {
        assert!(report.work_dir.join(format!("{name}.geojson")).exists());
        assert!(report.work_dir.join(format!("{name}-DEM-MEAN-LAKE-ELEVATION.tif")).exists());
    }

    let out: Raster<f64> = read_geotiff(&report.output).unwrap();
    assert_relative_eq!(out.get(4, 4).unwrap(), 8.0);
    assert_relative_eq!(out.get(8, 8).unwrap(), 5.0);
}

#[test]
fn test_working_directory_contents() {
    let inputs = Inputs::scenario();
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    assert_eq!(
        report.work_dir,
        inputs.root().join("work/PROCESS_DEM_IN_LAKE_REGIONS-2024-05-17-090307")
    );
    for name in [
        "INPUT-DEM-SINKS-FILLED.tif",
        "lake_1.geojson",
        "lake_1-DEM.tif",
        "lake_1-STATS.json",
        "lake_1-DEM-MEAN-LAKE-ELEVATION.tif",
        "merged_lake_elevation_files.tif",
        "merged_lake_elevation_files-polygon.geojson",
        "difference.geojson",
        "DEM-NON-LAKES_REGIONS.tif",
        "FINAL-DEM.tif",
        "run.json",
    ] {
        assert!(report.work_dir.join(name).exists(), "{name} missing");
    }
    // Outline files only for the boundary policy
    assert!(!report.work_dir.join("lake_1-LINE.geojson").exists());

    let manifest = RunManifest::read(&report.work_dir.join("run.json")).unwrap();
    assert_eq!(manifest.lakes, report.lakes);
    assert_eq!(manifest.started, "2024-05-17 09:03:07");
    let stages: Vec<Stage> = manifest.stages.iter().map(|t| t.stage).collect();
    assert_eq!(stages, &Stage::SEQUENCE[..Stage::SEQUENCE.len() - 1]);
}

#[test]
fn test_second_run_gets_suffixed_directory() {
    let inputs = Inputs::scenario();
    let pipeline = Pipeline::new(inputs.params.clone());
    let first = pipeline.run_at(at()).unwrap();
    let second = pipeline.run_at(at()).unwrap();

    assert_ne!(first.work_dir, second.work_dir);
    assert!(second
        .work_dir
        .to_string_lossy()
        .ends_with("PROCESS_DEM_IN_LAKE_REGIONS-2024-05-17-090307-1"));
}

#[test]
fn test_purge_keeps_output_only() {
    let mut inputs = Inputs::scenario();
    inputs.params.keep_intermediates = false;
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    assert!(report.purged);
    assert!(!report.work_dir.exists());
    assert!(report.output.exists());
}

#[test]
fn test_boundary_policy() {
    let mut inputs = Inputs::scenario();
    inputs.params.policy = ElevationPolicy::BoundaryMean;
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    assert!(report
        .work_dir
        .to_string_lossy()
        .contains("PROCESS_DEM_IN_LAKE_REGIONS_USING_BOUNDARY_PIXELS"));
    assert!(report.work_dir.join("lake_1-LINE.geojson").exists());
    assert!(report.work_dir.join("lake_1-PROFILED-POINTS.geojson").exists());

    let elevation = report.lakes[0].elevation;
    assert!(elevation > 5.0 && elevation < 8.0);

    let out: Raster<f64> = read_geotiff(&report.output).unwrap();
    // Float32 on disk
    assert_relative_eq!(out.get(4, 4).unwrap(), elevation, epsilon = 1e-4);
    assert_relative_eq!(out.get(0, 0).unwrap(), 5.0);
}

#[test]
fn test_fixed_policy_with_byte_export() {
    let mut inputs = Inputs::scenario();
    inputs.params.policy = ElevationPolicy::Fixed(42.0);
    inputs.params.pixel_type = Some(PixelType::Byte);
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    assert!(report
        .work_dir
        .to_string_lossy()
        .contains("PROCESS_DEM_WITH_1_LAKE_IN_REGION"));
    assert!(report.lakes[0].statistics.is_none());

    let (out, pixel_type) = read_geotiff_typed::<f64, _>(&report.output).unwrap();
    assert_eq!(pixel_type, PixelType::Byte);
    assert_eq!(out.get(4, 4).unwrap(), 42.0);
    assert_eq!(out.get(9, 9).unwrap(), 5.0);
}

#[test]
fn test_lakes_split_by_field() {
    let lakes = layer(
        &[
            (square(1.0, 7.0, 3.0, 9.0), r#"{"name": "B"}"#),
            (square(3.0, 4.0, 6.0, 7.0), r#"{"name": "A"}"#),
            (square(7.0, 1.0, 9.0, 3.0), r#"{"name": "B"}"#),
        ],
        None,
    );
    let mut dem = scenario_dem();
    for (row, col) in [(1, 1), (1, 2), (2, 1), (2, 2), (7, 7), (7, 8), (8, 7), (8, 8)] {
        dem.set(row, col, 7.0).unwrap();
    }
    let mut inputs = Inputs::new(&dem, &lakes);
    inputs.params.field = Some("name".into());
    let report = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap();

    let keys: Vec<&str> = report.lakes.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(keys, ["A", "B"]);
    assert_eq!(report.lakes[1].merged_features, 2);
    assert_eq!(report.lakes[1].cells, 8);
    assert!(report.work_dir.join("name_B.geojson").exists());

    let out: Raster<f64> = read_geotiff(&report.output).unwrap();
    assert_relative_eq!(out.get(4, 4).unwrap(), 8.0);
    assert_relative_eq!(out.get(1, 1).unwrap(), 7.0);
    assert_relative_eq!(out.get(8, 8).unwrap(), 7.0);
    assert_relative_eq!(out.get(5, 8).unwrap(), 5.0);
}

#[test]
fn test_crs_mismatch_fails_init() {
    let lakes = layer(&[(square(3.0, 4.0, 6.0, 7.0), "{}")], Some("EPSG:4326"));
    let inputs = Inputs::new(&scenario_dem(), &lakes);

    let err = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Init));
    assert!(matches!(err.core_error(), Some(Error::CrsMismatch(..))));
    assert!(!inputs.root().join("work").exists());
}

#[test]
fn test_missing_field_fails_split() {
    let mut inputs = Inputs::scenario();
    inputs.params.field = Some("lake_id".into());

    let err = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::SplitLakes));
    assert!(matches!(err.core_error(), Some(Error::MissingField(f)) if f == "lake_id"));
}

#[test]
fn test_lake_without_valid_elevation() {
    let mut dem = scenario_dem();
    for row in 3..6 {
        for col in 3..6 {
            dem.set(row, col, -3.0).unwrap();
        }
    }
    let lakes = layer(&[(square(3.0, 4.0, 6.0, 7.0), "{}")], None);
    let mut inputs = Inputs::new(&dem, &lakes);
    inputs.params.fill_sinks = false;

    let err = Pipeline::new(inputs.params.clone()).run_at(at()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Estimate));
    assert!(err.to_string().contains("No valid elevation data"));

    // Files of earlier stages stay
    let work = inputs
        .root()
        .join("work/PROCESS_DEM_IN_LAKE_REGIONS-2024-05-17-090307");
    assert!(work.join("lake_1-DEM.tif").exists());
    assert!(!work.join("run.json").exists());
    assert!(!inputs.params.output.exists());
}

#[test]
fn test_invalid_params_fail_before_reading() {
    let params = FlattenParams {
        policy: ElevationPolicy::Fixed(f64::NAN),
        ..Inputs::scenario().params
    };
    let err = Pipeline::new(params).run_at(at()).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Init));
}
