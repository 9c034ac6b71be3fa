//! Split a polygon layer by attribute value

use geo::{Geometry, MultiPolygon};
use lakeflat_core::vector::{Feature, FeatureCollection};
use lakeflat_core::{Error, Result};
use std::collections::{BTreeMap, HashSet};

/// One part of a split layer
#[derive(Debug, Clone)]
pub struct LayerPart {
    /// Split key: the attribute value as text, "NULL" when missing
    pub key: String,
    /// File-safe name, `<field>_<key>` when split by a field
    pub name: String,
    /// Single feature holding every polygon that shares the key
    pub layer: FeatureCollection,
    /// Number of input features merged into this part
    pub source_features: usize,
}

impl LayerPart {
    /// All polygons of the part
    pub fn polygons(&self) -> MultiPolygon<f64> {
        self.layer.to_multi_polygon()
    }
}

/// Replace characters that are unsafe in file names
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Split `layer` into one part per distinct value of `field`.
///
/// Without a field every feature becomes its own part, keyed by its id
/// or by `lake_<n>` (1-based position) when it has none. Features sharing
/// a key are merged into a single multipolygon feature that keeps the
/// attributes of the first one. Features without polygon geometry are
/// skipped. Parts are returned sorted by key. A name already taken by an
/// earlier part gets `-1`, `-2`, ... appended.
///
/// # Errors
/// * `EmptyLayer` when the layer has no polygon features
/// * `MissingField` when no feature carries `field`
pub fn split_by_field(layer: &FeatureCollection, field: Option<&str>) -> Result<Vec<LayerPart>> {
    if layer.is_empty() {
        return Err(Error::EmptyLayer);
    }
    if let Some(field) = field {
        if !layer.has_field(field) {
            return Err(Error::MissingField(field.to_string()));
        }
    }

    let mut groups: BTreeMap<String, Vec<&Feature>> = BTreeMap::new();
    for (index, feature) in layer.iter().enumerate() {
        if feature.polygons().is_empty() {
            continue;
        }
        let key = match field {
            Some(field) => feature
                .get_property(field)
                .map(ToString::to_string)
                .unwrap_or_else(|| "NULL".to_string()),
            None => feature
                .id
                .clone()
                .unwrap_or_else(|| format!("lake_{}", index + 1)),
        };
        groups.entry(key).or_default().push(feature);
    }

    if groups.is_empty() {
        return Err(Error::EmptyLayer);
    }

    let mut used = HashSet::new();
    let parts = groups
        .into_iter()
        .map(|(key, features)| {
            let polygons = MultiPolygon(features.iter().flat_map(|f| f.polygons()).collect());
            let merged = Feature {
                geometry: Some(Geometry::MultiPolygon(polygons)),
                properties: features[0].properties.clone(),
                id: features[0].id.clone(),
            };
            let base = match field {
                Some(field) => file_safe(&format!("{}_{}", field, key)),
                None => file_safe(&key),
            };
            // Distinct keys may clean up to the same name
            let mut name = base.clone();
            let mut suffix = 0;
            while !used.insert(name.clone()) {
                suffix += 1;
                name = format!("{}-{}", base, suffix);
            }
            LayerPart {
                name,
                layer: FeatureCollection::from_iter([merged]).with_crs(layer.crs.clone()),
                source_features: features.len(),
                key,
            }
        })
        .collect();

    Ok(parts)
}
