//! Pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of a run, in execution order.
///
/// `Clip`, `Estimate` and `Rasterize` repeat once per lake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Init,
    SplitLakes,
    FillSinks,
    Clip,
    Estimate,
    Rasterize,
    MergeLakeRasters,
    Polygonize,
    DifferenceAoi,
    ClipNonLake,
    FinalMosaic,
    Export,
    Done,
}

impl Stage {
    /// Every stage in execution order
    pub const SEQUENCE: [Stage; 13] = [
        Stage::Init,
        Stage::SplitLakes,
        Stage::FillSinks,
        Stage::Clip,
        Stage::Estimate,
        Stage::Rasterize,
        Stage::MergeLakeRasters,
        Stage::Polygonize,
        Stage::DifferenceAoi,
        Stage::ClipNonLake,
        Stage::FinalMosaic,
        Stage::Export,
        Stage::Done,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "INIT",
            Stage::SplitLakes => "SPLIT_LAKES",
            Stage::FillSinks => "FILL_SINKS",
            Stage::Clip => "CLIP",
            Stage::Estimate => "ESTIMATE",
            Stage::Rasterize => "RASTERIZE",
            Stage::MergeLakeRasters => "MERGE_LAKE_RASTERS",
            Stage::Polygonize => "POLYGONIZE",
            Stage::DifferenceAoi => "DIFFERENCE_AOI",
            Stage::ClipNonLake => "CLIP_NON_LAKE",
            Stage::FinalMosaic => "FINAL_MOSAIC",
            Stage::Export => "EXPORT",
            Stage::Done => "DONE",
        }
    }

    /// Whether the stage runs once per lake
    pub fn is_per_lake(&self) -> bool {
        matches!(self, Stage::Clip | Stage::Estimate | Stage::Rasterize)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_ordered() {
        assert!(Stage::SEQUENCE.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Stage::SEQUENCE.first(), Some(&Stage::Init));
        assert_eq!(Stage::SEQUENCE.last(), Some(&Stage::Done));
    }

    #[test]
    fn test_names_match_serde() {
        for stage in Stage::SEQUENCE {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.name()));
        }
        assert_eq!(Stage::DifferenceAoi.to_string(), "DIFFERENCE_AOI");
    }

    #[test]
    fn test_per_lake_stages() {
        let per_lake: Vec<_> = Stage::SEQUENCE.iter().filter(|s| s.is_per_lake()).collect();
        assert_eq!(per_lake, [&Stage::Clip, &Stage::Estimate, &Stage::Rasterize]);
    }
}
