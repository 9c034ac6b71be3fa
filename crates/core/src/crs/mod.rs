//! Coordinate Reference System handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation.
///
/// Only identification is supported: lakeflat never reprojects, it only
/// checks that a DEM and its vector layers declare the same system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// Parse an authority string.
    ///
    /// Accepts `EPSG:32634`, `urn:ogc:def:crs:EPSG::32634` and
    /// `urn:ogc:def:crs:EPSG:6.6:32634`. Anything else is kept as WKT.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if let Some(rest) = upper.strip_prefix("EPSG:") {
            if let Ok(code) = rest.parse() {
                return Self::from_epsg(code);
            }
        }

        if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
            if let Some(code) = upper.rsplit(':').next().and_then(|c| c.parse().ok()) {
                return Self::from_epsg(code);
            }
        }

        Self::from_wkt(trimmed)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // WKT comparison is textual and therefore conservative
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(32634);
        assert_eq!(crs.epsg(), Some(32634));
        assert_eq!(crs.identifier(), "EPSG:32634");
    }

    #[test]
    fn test_parse_authority_strings() {
        assert_eq!(CRS::parse("EPSG:32634").epsg(), Some(32634));
        assert_eq!(CRS::parse("urn:ogc:def:crs:EPSG::32635").epsg(), Some(32635));
        assert_eq!(CRS::parse("urn:ogc:def:crs:EPSG:6.6:3035").epsg(), Some(3035));
        assert_eq!(CRS::parse("LOCAL_CS[\"x\"]").epsg(), None);
    }

    #[test]
    fn test_crs_equivalence() {
        let a = CRS::from_epsg(32634);
        let b = CRS::parse("urn:ogc:def:crs:EPSG::32634");
        let c = CRS::from_epsg(32635);
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
        assert!(!a.is_equivalent(&CRS::from_wkt("PROJCS[...]")));
    }
}
