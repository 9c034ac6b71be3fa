//! Statistics over raster samples
//!
//! - **sample**: count, mean, spread and range of a set of elevations
//! - **profile**: elevations sampled along lines

pub mod profile;
pub mod sample;

pub use profile::{profile_along_lines, ProfilePoint};
pub use sample::{raster_statistics, SampleStatistics};
