//! Output sample types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sample type of a single-band raster on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// All supported types, in GDAL enumeration order
    pub const ALL: [PixelType; 7] = [
        PixelType::Byte,
        PixelType::UInt16,
        PixelType::Int16,
        PixelType::UInt32,
        PixelType::Int32,
        PixelType::Float32,
        PixelType::Float64,
    ];

    /// Whether samples are integers
    pub fn is_integer(&self) -> bool {
        !matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    /// Bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            PixelType::Byte => 8,
            PixelType::UInt16 | PixelType::Int16 => 16,
            PixelType::UInt32 | PixelType::Int32 | PixelType::Float32 => 32,
            PixelType::Float64 => 64,
        }
    }

    /// GDAL-style name
    pub fn name(&self) -> &'static str {
        match self {
            PixelType::Byte => "Byte",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PixelType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown pixel type '{}'; expected one of byte, uint16, int16, uint32, int32, float32, float64",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("float32".parse::<PixelType>().unwrap(), PixelType::Float32);
        assert_eq!("BYTE".parse::<PixelType>().unwrap(), PixelType::Byte);
        assert!("complex64".parse::<PixelType>().is_err());
    }

    #[test]
    fn test_integer_types() {
        assert!(PixelType::Int16.is_integer());
        assert!(!PixelType::Float64.is_integer());
        assert_eq!(PixelType::UInt16.bits(), 16);
    }
}
