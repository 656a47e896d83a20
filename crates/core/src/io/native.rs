//! Native GeoTIFF reading/writing for categorical grids
//!
//! Uses the `tiff` crate. Supports single-band integer imagery with the
//! GeoTIFF pixel scale/tiepoint tags, the EPSG geokeys and the GDAL_NODATA
//! tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{CategoryCode, GeoTransform, Grid, SpatialDescriptor, NODATA};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{Gray16, Gray8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Sample depth used when writing a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelDepth {
    /// 8-bit unsigned, NoData written as 255; codes 255 and up do not fit
    U8,
    /// 16-bit unsigned, NoData written as 65535
    #[default]
    U16,
}

impl PixelDepth {
    /// On-disk value used for NoData cells
    pub fn nodata_value(self) -> u32 {
        match self {
            PixelDepth::U8 => u8::MAX as u32,
            PixelDepth::U16 => u16::MAX as u32,
        }
    }

    /// Check that every code of `grid` can be written at this depth.
    ///
    /// # Errors
    /// `UnsupportedDataType` naming the first code that collides with, or
    /// exceeds, the on-disk NoData value.
    pub fn ensure_fits(self, grid: &Grid) -> Result<()> {
        let limit = self.nodata_value();
        match grid
            .data()
            .iter()
            .find(|&&v| v != NODATA && u32::from(v) >= limit)
        {
            Some(&v) => Err(Error::UnsupportedDataType(format!(
                "Code {} does not fit a {:?} grid",
                v, self
            ))),
            None => Ok(()),
        }
    }
}

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    pub pixel_depth: PixelDepth,
}

/// Read a single-band categorical GeoTIFF.
///
/// Cells equal to the file's GDAL_NODATA value become [`NODATA`].
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<(Grid, SpatialDescriptor)> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read only the spatial metadata of a GeoTIFF, without decoding pixels
pub fn read_geotiff_header<P: AsRef<Path>>(path: P) -> Result<SpatialDescriptor> {
    let file = File::open(path.as_ref())?;
    let mut decoder =
        Decoder::new(file).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;
    Ok(read_descriptor(&mut decoder))
}

/// Read a categorical GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<(Grid, SpatialDescriptor)> {
    decode_geotiff(Cursor::new(data))
}

/// Internal: decode from any `Read + Seek` source
fn decode_geotiff<R>(reader: R) -> Result<(Grid, SpatialDescriptor)>
where
    R: std::io::Read + std::io::Seek,
{
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    // Tags must be read before the image data consumes the decoder state.
    let nodata = read_nodata(&mut decoder);
    let descriptor = read_descriptor(&mut decoder);

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<CategoryCode> = match result {
        DecodingResult::U8(buf) => convert(buf, nodata)?,
        DecodingResult::U16(buf) => convert(buf, nodata)?,
        DecodingResult::U32(buf) => convert(buf, nodata)?,
        DecodingResult::I8(buf) => convert(buf, nodata)?,
        DecodingResult::I16(buf) => convert(buf, nodata)?,
        DecodingResult::I32(buf) => convert(buf, nodata)?,
        _ => {
            return Err(Error::UnsupportedDataType(
                "Categorical grids require integer samples".to_string(),
            ))
        }
    };

    let grid = Grid::from_vec(data, rows, cols)?;
    Ok((grid, descriptor))
}

fn read_descriptor<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> SpatialDescriptor {
    let transform = read_geotransform(decoder).unwrap_or_default();
    SpatialDescriptor::new(transform, read_crs(decoder))
}

/// Map raw samples to category codes, turning the file NoData into [`NODATA`].
///
/// A sample equal to the in-memory sentinel that is not the file's NoData
/// value is rejected rather than read as missing.
fn convert<T>(buf: Vec<T>, nodata: Option<i64>) -> Result<Vec<CategoryCode>>
where
    T: Copy + Into<i64>,
{
    buf.into_iter()
        .map(|raw| {
            let v: i64 = raw.into();
            if Some(v) == nodata {
                return Ok(NODATA);
            }
            match CategoryCode::try_from(v) {
                Ok(code) if code != NODATA => Ok(code),
                _ => Err(Error::UnsupportedDataType(format!(
                    "Sample value {} is not a category code",
                    v
                ))),
            }
        })
        .collect()
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<i64> {
    let text = decoder.get_tag_ascii_string(tag(GDAL_NODATA)).ok()?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    if value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok()?;
    GeoTransform::from_tiff_tags(&scale, &tiepoint)
}

/// EPSG code from ProjectedCSTypeGeoKey or GeographicTypeGeoKey
fn read_crs<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(tag(GEO_KEY_DIRECTORY)).ok()?;
    if keys.len() < 4 {
        return None;
    }
    let num_keys = keys[3] as usize;
    keys[4..]
        .chunks_exact(4)
        .take(num_keys)
        .find_map(|entry| match entry {
            // location 0 means the value is stored inline
            [PROJECTED_CS_TYPE_KEY | GEOGRAPHIC_TYPE_KEY, 0, _, code] if *code > 0 => {
                Some(CRS::from_epsg(u32::from(*code)))
            }
            _ => None,
        })
}

/// Write a grid to a GeoTIFF file.
///
/// The image is encoded in memory first; the file is only created once
/// encoding has succeeded.
pub fn write_geotiff<P: AsRef<Path>>(
    grid: &Grid,
    descriptor: &SpatialDescriptor,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()> {
    let buf = write_geotiff_to_buffer(grid, descriptor, options)?;
    let mut file = BufWriter::new(File::create(path.as_ref())?);
    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

/// Write a grid to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(
    grid: &Grid,
    descriptor: &SpatialDescriptor,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(grid, descriptor, Cursor::new(&mut buf), options.unwrap_or_default())?;
    Ok(buf)
}

/// Internal: encode into any `Write + Seek` sink
fn encode_geotiff<W>(
    grid: &Grid,
    descriptor: &SpatialDescriptor,
    writer: W,
    options: GeoTiffOptions,
) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
{
    let mut encoder =
        TiffEncoder::new(writer).map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = grid.shape();
    let depth = options.pixel_depth;
    let nodata = depth.nodata_value();
    depth.ensure_fits(grid)?;

    let samples: Vec<u32> = grid
        .data()
        .iter()
        .map(|&v| if v == NODATA { nodata } else { u32::from(v) })
        .collect();

    match depth {
        PixelDepth::U8 => {
            let mut image = encoder
                .new_image::<Gray8>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            write_geo_tags(image.encoder(), descriptor, nodata)?;
            let data: Vec<u8> = samples.iter().map(|&v| v as u8).collect();
            image
                .write_data(&data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }
        PixelDepth::U16 => {
            let mut image = encoder
                .new_image::<Gray16>(cols as u32, rows as u32)
                .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;
            write_geo_tags(image.encoder(), descriptor, nodata)?;
            let data: Vec<u16> = samples.iter().map(|&v| v as u16).collect();
            image
                .write_data(&data)
                .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
        }
    }

    Ok(())
}

fn write_geo_tags<W, K>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    descriptor: &SpatialDescriptor,
    nodata: u32,
) -> Result<()>
where
    W: std::io::Write + std::io::Seek,
    K: TiffKind,
{
    let gt = descriptor.transform;
    let scale = gt.pixel_scale();
    dir.write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;

    let tiepoint = gt.tiepoint();
    dir.write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;

    // Version 1.1.0, then (key, location, count, value) entries.
    // GTRasterTypeGeoKey = RasterPixelIsArea.
    let geographic = descriptor.crs.as_ref().is_some_and(CRS::is_geographic);
    let model_type = if geographic { 2 } else { 1 };
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, model_type, 1025, 0, 1, 1];
    if let Some(code) = descriptor
        .crs
        .as_ref()
        .and_then(CRS::epsg)
        .and_then(|c| u16::try_from(c).ok())
    {
        let key = if geographic {
            GEOGRAPHIC_TYPE_KEY
        } else {
            PROJECTED_CS_TYPE_KEY
        };
        geokeys.extend_from_slice(&[key, 0, 1, code]);
        geokeys[3] = 3;
    }
    dir.write_tag(tag(GEO_KEY_DIRECTORY), geokeys.as_slice())
        .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;

    let nodata_text = nodata.to_string();
    dir.write_tag(tag(GDAL_NODATA), nodata_text.as_str())
        .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;

    Ok(())
}
