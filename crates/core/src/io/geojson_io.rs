//! GeoJSON reading and writing for vector layers
//!
//! Projected layers carry the legacy (2008) `crs` member, which GDAL and
//! QGIS both still read and write.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::Geometry;
use geojson::feature::Id;
use geojson::{GeoJson, JsonObject};
use std::fs;
use std::path::Path;

/// Read a GeoJSON file (FeatureCollection, Feature or bare Geometry)
pub fn read_features<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    read_features_from_str(&text)
}

/// Parse GeoJSON text into a FeatureCollection
pub fn read_features_from_str(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;

    match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = fc.foreign_members.as_ref().and_then(crs_member);
            let features = fc
                .features
                .into_iter()
                .map(convert_feature)
                .collect::<Result<Vec<_>>>()?;
            Ok(FeatureCollection { features, crs })
        }
        GeoJson::Feature(f) => {
            let crs = f.foreign_members.as_ref().and_then(crs_member);
            Ok(FeatureCollection {
                features: vec![convert_feature(f)?],
                crs,
            })
        }
        GeoJson::Geometry(g) => {
            let geometry = Geometry::<f64>::try_from(g)?;
            Ok(FeatureCollection::from_iter([Feature::new(geometry)]))
        }
    }
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .map(Geometry::<f64>::try_from)
        .transpose()?;

    let id = feature.id.map(|id| match id {
        Id::String(s) => s,
        Id::Number(n) => n.to_string(),
    });

    let properties = feature
        .properties
        .unwrap_or_default()
        .iter()
        .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
        .collect();

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

/// `{"crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32634"}}}`
fn crs_member(members: &JsonObject) -> Option<CRS> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;

    // CRS84 is the GeoJSON default and carries no information
    if name.ends_with("CRS84") {
        return None;
    }
    Some(CRS::parse(name))
}

/// Write a FeatureCollection as GeoJSON
pub fn write_features<P: AsRef<Path>>(layer: &FeatureCollection, path: P) -> Result<()> {
    let features = layer
        .features
        .iter()
        .map(|f| geojson::Feature {
            bbox: None,
            geometry: f
                .geometry
                .as_ref()
                .map(|g| geojson::Geometry::new(geojson::Value::from(g))),
            id: f.id.clone().map(Id::String),
            properties: Some(
                f.properties
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            foreign_members: None,
        })
        .collect();

    let foreign_members = layer.crs.as_ref().and_then(|crs| crs.epsg()).map(|code| {
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({
                "type": "name",
                "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", code) }
            }),
        );
        members
    });

    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    };

    fs::write(path.as_ref(), GeoJson::FeatureCollection(fc).to_string())
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    const LAKES: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::32634" } },
        "features": [
            { "type": "Feature", "id": 4,
              "properties": { "lake_id": 1, "name": "Prespa" },
              "geometry": { "type": "Polygon",
                "coordinates": [[[0,0],[4,0],[4,4],[0,4],[0,0]]] } },
            { "type": "Feature",
              "properties": { "lake_id": 2, "name": null },
              "geometry": null }
        ]
    }"#;

    #[test]
    fn test_read_collection_with_crs() {
        let layer = read_features_from_str(LAKES).unwrap();
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.crs.as_ref().and_then(|c| c.epsg()), Some(32634));

        let first = &layer.features[0];
        assert_eq!(first.id.as_deref(), Some("4"));
        assert_eq!(first.get_property("lake_id"), Some(&AttributeValue::Int(1)));
        assert_eq!(first.polygons().len(), 1);

        let second = &layer.features[1];
        assert!(second.geometry.is_none());
        assert_eq!(second.get_property("name"), Some(&AttributeValue::Null));
    }

    #[test]
    fn test_bare_geometry() {
        let text = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        let layer = read_features_from_str(text).unwrap();
        assert_eq!(layer.len(), 1);
        assert!(layer.crs.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lake.geojson");

        let square = polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)];
        let mut layer = FeatureCollection::new().with_crs(Some(CRS::from_epsg(3035)));
        layer.push(Feature::new(square).with_property("DN", AttributeValue::Float(412.5)));
        write_features(&layer, &path).unwrap();

        let back = read_features(&path).unwrap();
        assert_eq!(back.crs.and_then(|c| c.epsg()), Some(3035));
        assert_eq!(
            back.features[0].get_property("DN"),
            Some(&AttributeValue::Float(412.5))
        );
    }

    #[test]
    fn test_invalid_json_is_vector_error() {
        let err = read_features_from_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Vector(_)));
    }
}
