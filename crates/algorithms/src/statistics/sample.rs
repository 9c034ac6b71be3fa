//! Summary statistics of elevation samples

use lakeflat_core::raster::Raster;
use serde::{Deserialize, Serialize};

/// Summary of a set of finite samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStatistics {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl SampleStatistics {
    /// Statistics of the finite values; `None` when there are none
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let vals: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if vals.is_empty() {
            return None;
        }

        let count = vals.len();
        let sum: f64 = vals.iter().sum();
        let mean = sum / count as f64;
        let var = vals.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count as f64;
        let min = vals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = vals.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            sum,
            mean,
            std_dev: var.sqrt(),
            min,
            max,
        })
    }

    /// Range of the samples
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

/// Statistics of the valid cells of a raster
pub fn raster_statistics(raster: &Raster<f64>) -> Option<SampleStatistics> {
    SampleStatistics::from_values(raster.data().iter().copied().filter(|&v| !raster.is_nodata(v)))
}
