//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Georeferencing is carried by the
//! ModelPixelScale / ModelTiepoint tags, the CRS by the GeoKey directory
//! (EPSG codes only) and the no-data value by the GDAL_NODATA tag. When a
//! file has no georeferencing tags, a sidecar world file is used instead.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::io::world_file;
use crate::raster::{GeoTransform, PixelType, Raster, RasterElement};
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{
    ColorType, Gray16, Gray32, Gray32Float, Gray64Float, Gray8, GrayI16, GrayI32,
};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// GeoTIFF tags are decoded into named variants, never `Tag::Unknown`
fn geo_tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Sample type written to disk
    pub pixel_type: PixelType,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            pixel_type: PixelType::Float32,
        }
    }
}

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    read_geotiff_typed(path).map(|(raster, _)| raster)
}

/// Read a GeoTIFF and report the sample type it was stored with
pub fn read_geotiff_typed<T, P>(path: P) -> Result<(Raster<T>, PixelType)>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    let (mut raster, pixel_type, georeferenced) = decode_geotiff(file)?;

    if !georeferenced {
        let sidecar = world_file::world_file_path(path);
        if sidecar.exists() {
            raster.set_transform(world_file::read_world_file(&sidecar)?);
        }
    }

    Ok((raster, pixel_type))
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data)).map(|(raster, _, _)| raster)
}

fn cast_samples<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

/// Decode a GeoTIFF from any `Read + Seek` source.
///
/// Returns the raster, its on-disk sample type and whether georeferencing
/// tags were present.
fn decode_geotiff<T, R>(reader: R) -> Result<(Raster<T>, PixelType, bool)>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let (data, pixel_type): (Vec<T>, PixelType) = match result {
        DecodingResult::U8(buf) => (cast_samples(buf), PixelType::Byte),
        DecodingResult::U16(buf) => (cast_samples(buf), PixelType::UInt16),
        DecodingResult::I16(buf) => (cast_samples(buf), PixelType::Int16),
        DecodingResult::U32(buf) => (cast_samples(buf), PixelType::UInt32),
        DecodingResult::I32(buf) => (cast_samples(buf), PixelType::Int32),
        DecodingResult::F32(buf) => (cast_samples(buf), PixelType::Float32),
        DecodingResult::F64(buf) => (cast_samples(buf), PixelType::Float64),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    let transform = read_geotransform(&mut decoder);
    let georeferenced = transform.is_some();
    if let Some(transform) = transform {
        raster.set_transform(transform);
    }

    raster.set_crs(read_crs(&mut decoder));

    if let Ok(text) = decoder.get_tag_ascii_string(geo_tag(GDAL_NODATA)) {
        let nodata = text
            .trim_matches(char::from(0))
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .and_then(T::from_f64);
        raster.set_nodata(nodata);
    }

    Ok((raster, pixel_type, georeferenced))
}

/// Read the GeoTransform from ModelPixelScale + ModelTiepoint tags
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(geo_tag(MODEL_PIXEL_SCALE))
        .ok()?;
    let tiepoint = decoder.get_tag_f64_vec(geo_tag(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// Read an EPSG code from the GeoKey directory, if one is declared
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder
        .get_tag_u16_vec(geo_tag(GEO_KEY_DIRECTORY))
        .ok()?;

    // Header is 4 shorts, then one 4-short entry per key:
    // [key_id, tag_location, count, value]
    let mut found = None;
    for entry in keys.get(4..)?.chunks_exact(4) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        // Only inline values; 32767 means user-defined
        if location != 0 || value == 0 || value == 32767 {
            continue;
        }
        match key {
            PROJECTED_CS_TYPE_KEY => return Some(CRS::from_epsg(value as u32)),
            GEOGRAPHIC_TYPE_KEY => found = Some(CRS::from_epsg(value as u32)),
            _ => {}
        }
    }
    found
}

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let options = options.unwrap_or_default();
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, &mut writer, options.pixel_type)?;
    writer.flush()?;
    Ok(())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>, options: Option<GeoTiffOptions>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let options = options.unwrap_or_default();
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options.pixel_type)?;
    Ok(buf)
}

/// Convert raster cells to the on-disk sample type.
///
/// No-data cells and values the target type cannot represent become the
/// target's default no-data.
fn to_samples<T, U>(raster: &Raster<T>) -> Vec<U>
where
    T: RasterElement,
    U: RasterElement,
{
    raster
        .data()
        .iter()
        .map(|&v| {
            if raster.is_nodata(v) {
                return U::default_nodata();
            }
            v.to_f64()
                .and_then(U::from_f64)
                .unwrap_or_else(U::default_nodata)
        })
        .collect()
}

fn nodata_text<U: RasterElement>() -> String {
    match U::default_nodata().to_f64() {
        Some(v) if v.is_finite() => format!("{}", v),
        _ => "nan".to_string(),
    }
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, pixel_type: PixelType) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    match pixel_type {
        PixelType::Byte => encode_samples::<Gray8, _, _>(&mut encoder, raster),
        PixelType::UInt16 => encode_samples::<Gray16, _, _>(&mut encoder, raster),
        PixelType::Int16 => encode_samples::<GrayI16, _, _>(&mut encoder, raster),
        PixelType::UInt32 => encode_samples::<Gray32, _, _>(&mut encoder, raster),
        PixelType::Int32 => encode_samples::<GrayI32, _, _>(&mut encoder, raster),
        PixelType::Float32 => encode_samples::<Gray32Float, _, _>(&mut encoder, raster),
        PixelType::Float64 => encode_samples::<Gray64Float, _, _>(&mut encoder, raster),
    }
}

fn encode_samples<C, T, W>(encoder: &mut TiffEncoder<W>, raster: &Raster<T>) -> Result<()>
where
    C: ColorType,
    C::Inner: RasterElement,
    [C::Inner]: TiffValue,
    T: RasterElement,
    W: Write + Seek,
{
    let (rows, cols) = raster.shape();
    let data: Vec<C::Inner> = to_samples(raster);

    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

    let gt = raster.transform();

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(geo_tag(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(geo_tag(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    let geokeys = geo_key_directory(raster.crs());
    image
        .encoder()
        .write_tag(geo_tag(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    let nodata = nodata_text::<C::Inner>();
    image
        .encoder()
        .write_tag(geo_tag(GDAL_NODATA), nodata.as_str())
        .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;

    image
        .write_data(&data)
        .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;

    Ok(())
}

/// Minimal GeoKey directory: model type, PixelIsArea and the EPSG code when known.
fn geo_key_directory(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs
        .and_then(|c| c.epsg())
        .and_then(|code| u16::try_from(code).ok());

    // EPSG codes 4000..5000 are geographic systems
    let geographic = epsg.map_or(false, |code| (4000..5000).contains(&code));
    let model_type = if geographic { 2 } else { 1 };

    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE_KEY, 0, 1, model_type],
        [GT_RASTER_TYPE_KEY, 0, 1, 1],
    ];
    if let Some(code) = epsg {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        entries.push([key, 0, 1, code]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}
