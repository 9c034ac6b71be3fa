//! Constant rasters shaped like a template

use lakeflat_core::raster::Raster;
use lakeflat_core::{Error, Result};

/// Copy of `template` where every valid cell holds `value`.
///
/// No-data cells of the template become NaN, and NaN is the result's
/// no-data value, so the footprint of the template is preserved.
///
/// # Errors
/// Returns `InvalidParameter` if `value` is NaN or infinite.
pub fn constant_like(template: &Raster<f64>, value: f64) -> Result<Raster<f64>> {
    if !value.is_finite() {
        return Err(Error::InvalidParameter {
            name: "value",
            value: value.to_string(),
            reason: "a flattened surface needs a finite elevation".into(),
        });
    }

    let mut output = template.clone();
    output.data_mut().mapv_inplace(|v| {
        if template.is_nodata(v) {
            f64::NAN
        } else {
            value
        }
    });
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_keeps_footprint() {
        let mut template = Raster::from_vec(vec![1.0, f64::NAN, -9999.0, 4.0], 2, 2).unwrap();
        template.set_nodata(Some(-9999.0));

        let flat = constant_like(&template, 412.25).unwrap();

        assert_eq!(flat.get(0, 0).unwrap(), 412.25);
        assert!(flat.get(0, 1).unwrap().is_nan());
        assert!(flat.get(1, 0).unwrap().is_nan());
        assert_eq!(flat.get(1, 1).unwrap(), 412.25);
        assert_eq!(flat.transform(), template.transform());
    }

    #[test]
    fn test_constant_rejects_nan() {
        let template: Raster<f64> = Raster::filled(3, 3, 1.0);
        assert!(constant_like(&template, f64::NAN).is_err());
        assert!(constant_like(&template, f64::INFINITY).is_err());
    }
}
