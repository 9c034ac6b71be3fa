//! Sink filling
//!
//! Implements the Planchon-Darboux (2001) algorithm for filling
//! depressions in a DEM so that every cell drains to an outlet.
//!
//! Outlets are the grid border and every cell touching a no-data cell,
//! so holes in the DEM behave like the outside of the grid.
//!
//! Reference:
//! Planchon, O., Darboux, F. (2001). A fast, simple and versatile algorithm
//! to fill the depressions of digital elevation models.
//! Catena, 46(2-3), 159-176.

use lakeflat_core::raster::Raster;
use lakeflat_core::{Algorithm, Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Parameters for sink filling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillSinksParams {
    /// Minimum slope, in degrees, enforced along filled flow paths.
    /// Set to 0.0 to leave flat areas after filling.
    pub min_slope: f64,
}

impl Default for FillSinksParams {
    fn default() -> Self {
        Self { min_slope: 0.01 }
    }
}

/// Fill sinks algorithm
#[derive(Debug, Clone, Default)]
pub struct FillSinks;

impl Algorithm for FillSinks {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = FillSinksParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Fill Sinks"
    }

    fn description(&self) -> &'static str {
        "Fill depressions in a DEM using Planchon-Darboux (2001) method"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fill_sinks(&input, params)
    }
}

/// D8 neighbor offsets: (row_offset, col_offset)
const D8_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// D8 distances in cells: cardinal = 1, diagonal = sqrt(2)
const D8_DISTANCES: [f64; 8] = [
    std::f64::consts::SQRT_2, 1.0, std::f64::consts::SQRT_2,
    1.0,                           1.0,
    std::f64::consts::SQRT_2, 1.0, std::f64::consts::SQRT_2,
];

/// Fill depressions in a DEM using the Planchon-Darboux (2001) algorithm.
///
/// The result is never lower than the input, no-data cells stay no-data,
/// and outlet cells keep their elevation. Filling an already filled DEM
/// with the same parameters returns it unchanged.
///
/// Rasters with fewer than 3 rows or columns have no interior and are
/// returned as they are.
///
/// # Arguments
/// * `dem` - Input DEM raster
/// * `params` - Fill parameters (minimum slope in degrees)
///
/// # Returns
/// A new raster with all depressions filled
pub fn fill_sinks(dem: &Raster<f64>, params: FillSinksParams) -> Result<Raster<f64>> {
    if !params.min_slope.is_finite() || !(0.0..90.0).contains(&params.min_slope) {
        return Err(Error::InvalidParameter {
            name: "min_slope",
            value: params.min_slope.to_string(),
            reason: "must be in [0, 90) degrees".into(),
        });
    }

    let (rows, cols) = dem.shape();
    if rows < 3 || cols < 3 {
        return Ok(dem.clone());
    }

    let epsilon = params.min_slope.to_radians().tan() * dem.cell_size();
    let is_nodata = |row: usize, col: usize| dem.is_nodata(unsafe { dem.get_unchecked(row, col) });

    // Step 1: initialize the water surface W.
    // Outlets take the DEM value, every other valid cell starts "infinitely" high.
    let big_value = f64::MAX / 2.0;
    let mut w = Array2::from_elem((rows, cols), big_value);
    let mut fixed = Array2::from_elem((rows, cols), false);

    for row in 0..rows {
        for col in 0..cols {
            let val = unsafe { dem.get_unchecked(row, col) };

            if is_nodata(row, col) {
                w[(row, col)] = val;
                fixed[(row, col)] = true;
                continue;
            }

            let on_border = row == 0 || row == rows - 1 || col == 0 || col == cols - 1;
            let touches_nodata = !on_border
                && D8_OFFSETS.iter().any(|&(dr, dc)| {
                    is_nodata((row as isize + dr) as usize, (col as isize + dc) as usize)
                });

            if on_border || touches_nodata {
                w[(row, col)] = val;
                fixed[(row, col)] = true;
            }
        }
    }

    // Step 2: lower W until stable.
    // A cell is lowered to max(DEM(c), W(n) + epsilon_d) for the best neighbor n.
    let mut changed = true;
    while changed {
        changed = false;

        // Forward pass: top-left to bottom-right
        for row in 1..rows - 1 {
            for col in 1..cols - 1 {
                changed |= relax_cell(dem, &mut w, &fixed, row, col, epsilon, big_value);
            }
        }

        // Backward pass: bottom-right to top-left
        for row in (1..rows - 1).rev() {
            for col in (1..cols - 1).rev() {
                changed |= relax_cell(dem, &mut w, &fixed, row, col, epsilon, big_value);
            }
        }
    }

    // Every valid cell reaches an outlet, this only guards against malformed input
    for ((row, col), value) in w.indexed_iter_mut() {
        if *value >= big_value {
            *value = unsafe { dem.get_unchecked(row, col) };
        }
    }

    let mut output = dem.like(0.0);
    *output.data_mut() = w;

    Ok(output)
}

/// One Planchon-Darboux update of an interior, non-outlet cell.
/// Returns whether W changed.
#[inline]
fn relax_cell(
    dem: &Raster<f64>,
    w: &mut Array2<f64>,
    fixed: &Array2<bool>,
    row: usize,
    col: usize,
    epsilon: f64,
    big_value: f64,
) -> bool {
    if fixed[(row, col)] {
        return false;
    }

    let dem_val = unsafe { dem.get_unchecked(row, col) };
    if w[(row, col)] <= dem_val {
        return false;
    }

    let mut changed = false;
    for (idx, &(dr, dc)) in D8_OFFSETS.iter().enumerate() {
        let nr = (row as isize + dr) as usize;
        let nc = (col as isize + dc) as usize;

        let wn = w[(nr, nc)];
        if wn.is_nan() || wn >= big_value || dem.is_nodata(wn) {
            continue;
        }

        let new_val = wn + epsilon * D8_DISTANCES[idx];
        if dem_val >= new_val {
            w[(row, col)] = dem_val;
            return true;
        }
        if w[(row, col)] > new_val {
            w[(row, col)] = new_val;
            changed = true;
        }
    }
    changed
}
