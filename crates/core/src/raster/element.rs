//! Raster element trait for generic cell values

use crate::raster::PixelType;
use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Sample type written to GeoTIFF for this element
    const PIXEL_TYPE: PixelType;

    /// Default no-data value for this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert an f64 into this type, rounding to nearest for integers.
    ///
    /// Returns `None` for NaN and for values outside the type's range.
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_raster_element_int {
    ($t:ty, $pt:expr, $nodata:expr) => {
        impl RasterElement for $t {
            const PIXEL_TYPE: PixelType = $pt;

            fn default_nodata() -> Self {
                $nodata
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata.map_or(false, |nd| *self == nd)
            }

            fn from_f64(value: f64) -> Option<Self> {
                if value.is_nan() {
                    return None;
                }
                NumCast::from(value.round())
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty, $pt:expr) => {
        impl RasterElement for $t {
            const PIXEL_TYPE: PixelType = $pt;

            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }

            fn from_f64(value: f64) -> Option<Self> {
                if value.is_nan() {
                    return None;
                }
                NumCast::from(value)
            }
        }
    };
}

// Integer nodata follows GDAL conventions for unsigned bytes (0) and the
// type minimum elsewhere.
impl_raster_element_int!(u8, PixelType::Byte, 0);
impl_raster_element_int!(u16, PixelType::UInt16, u16::MAX);
impl_raster_element_int!(i16, PixelType::Int16, i16::MIN);
impl_raster_element_int!(u32, PixelType::UInt32, u32::MAX);
impl_raster_element_int!(i32, PixelType::Int32, i32::MIN);
impl_raster_element_float!(f32, PixelType::Float32);
impl_raster_element_float!(f64, PixelType::Float64);
