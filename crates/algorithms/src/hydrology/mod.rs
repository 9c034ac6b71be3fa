//! Hydrological conditioning of Digital Elevation Models
//!
//! - Fill sinks: remove depressions so every cell drains to an outlet

pub(crate) mod fill_sinks;

pub use fill_sinks::{fill_sinks, FillSinks, FillSinksParams};
