//! Native GeoTIFF reading/writing through the `tiff` crate

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

fn tiff_err(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

/// Read the first band of a GeoTIFF file as an elevation raster
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Raster<f64>> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF held in memory
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<Raster<f64>> {
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster<f64>> {
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<f64> = match decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?
    {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".into())),
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

/// Transform from ModelPixelScale + ModelTiepoint, if both tags are present
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

/// GDAL stores the no-data value as an ASCII tag
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
}

/// Write a raster as a single-band 32-bit float GeoTIFF.
///
/// Invalid cells are written as NaN.
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster<f64>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file)
}

/// Write a raster to an in-memory GeoTIFF
pub fn write_geotiff_to_buffer(raster: &Raster<f64>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<W: Write + Seek>(raster: &Raster<f64>, writer: W) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| if raster.is_nodata(v) { f32::NAN } else { v as f32 })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;

    // Version 1.1.0 with two keys: ModelTypeProjected, RasterPixelIsArea
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(tiff_err("Cannot write geokey tag"))?;

    image
        .encoder()
        .write_tag(Tag::Unknown(GDAL_NODATA), "nan")
        .map_err(tiff_err("Cannot write nodata tag"))?;

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}
