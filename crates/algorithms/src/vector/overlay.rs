//! Polygon overlay: dissolve and difference

use geo::{BooleanOps, Geometry, MultiPolygon, Polygon};
use lakeflat_core::vector::{Feature, FeatureCollection};

/// Dissolve polygons into one multipolygon.
///
/// Parts are merged pairwise, so each union works on inputs of similar size.
pub fn union_all<I>(polygons: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = Polygon<f64>>,
{
    let mut parts: Vec<MultiPolygon<f64>> = polygons
        .into_iter()
        .map(|p| MultiPolygon(vec![p]))
        .collect();

    while parts.len() > 1 {
        parts = parts
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => a.union(b),
                _ => pair[0].clone(),
            })
            .collect();
    }

    parts.pop().unwrap_or_else(|| MultiPolygon(Vec::new()))
}

/// Subtract every polygon of `overlay` from each feature of `input`.
///
/// Attributes and ids of `input` are kept; features that vanish entirely are
/// dropped. The result carries the CRS of `input`.
pub fn difference(input: &FeatureCollection, overlay: &FeatureCollection) -> FeatureCollection {
    let cutter = union_all(overlay.iter().flat_map(Feature::polygons));

    let features = input
        .iter()
        .filter_map(|feature| {
            let polygons = feature.polygons();
            if polygons.is_empty() {
                return None;
            }
            let own = union_all(polygons);
            let rest = if cutter.0.is_empty() {
                own
            } else {
                own.difference(&cutter)
            };
            if rest.0.is_empty() {
                return None;
            }
            Some(Feature {
                geometry: Some(Geometry::MultiPolygon(rest)),
                properties: feature.properties.clone(),
                id: feature.id.clone(),
            })
        })
        .collect::<FeatureCollection>();

    features.with_crs(input.crs.clone())
}
