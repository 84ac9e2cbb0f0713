//! Single-band GeoTIFF reader used as the file-backed [`RasterSource`].

use std::path::{Path, PathBuf};

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::raster::{GeoTransform, Raster, RasterSource};
use crate::{Result, SnowbandError};

const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GDAL_NODATA: u16 = 42113;

/// A GeoTIFF on disk; decoded on every [`RasterSource::read_band`] call.
#[derive(Debug, Clone)]
pub struct GeoTiffSource {
    path: PathBuf,
}

impl GeoTiffSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RasterSource for GeoTiffSource {
    fn read_band(&self) -> Result<Raster> {
        let file = std::fs::File::open(&self.path).map_err(|source| SnowbandError::InputRead {
            path: self.path.display().to_string(),
            source,
        })?;
        let mut decoder = Decoder::new(file)?;

        // DEMs at native resolution easily exceed the default buffer limits.
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024;
        limits.intermediate_buffer_size = 1024 * 1024 * 1024;
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;

        let tiepoint = decoder
            .get_tag_f64_vec(Tag::Unknown(TAG_MODEL_TIEPOINT))
            .map_err(|_| SnowbandError::InvalidGeoTiff(format!("{}: missing ModelTiepoint tag", self.path.display())))?;
        let scale = decoder
            .get_tag_f64_vec(Tag::Unknown(TAG_MODEL_PIXEL_SCALE))
            .map_err(|_| SnowbandError::InvalidGeoTiff(format!("{}: missing ModelPixelScale tag", self.path.display())))?;
        let transform = transform_from_tags(&tiepoint, &scale)?;

        let nodata = decoder
            .get_tag_ascii_string(Tag::Unknown(TAG_GDAL_NODATA))
            .ok()
            .and_then(|s| parse_nodata(&s));

        let data = decode_samples(decoder.read_image()?);

        debug!(
            path = %self.path.display(),
            width,
            height,
            pixel_width = transform.pixel_width,
            pixel_height = transform.pixel_height,
            ?nodata,
            "decoded raster band"
        );

        Ok(Raster::from_vec(data, width as usize, height as usize, transform)?.with_nodata(nodata))
    }
}

/// Build a geotransform from ModelTiepoint `[i, j, k, x, y, z]` and
/// ModelPixelScale `[sx, sy, sz]`. Rows run north to south.
pub fn transform_from_tags(tiepoint: &[f64], scale: &[f64]) -> Result<GeoTransform> {
    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(SnowbandError::InvalidGeoTiff(format!(
            "short georeferencing tags (tiepoint {} values, scale {} values)",
            tiepoint.len(),
            scale.len()
        )));
    }
    let (sx, sy) = (scale[0], scale[1]);
    if !(sx > 0.0 && sy > 0.0) {
        return Err(SnowbandError::InvalidGeoTiff(format!("non-positive pixel scale ({sx}, {sy})")));
    }
    let origin_x = tiepoint[3] - tiepoint[0] * sx;
    let origin_y = tiepoint[4] + tiepoint[1] * sy;
    Ok(GeoTransform::new(origin_x, origin_y, sx, -sy))
}

/// GDAL stores the nodata value as ASCII, sometimes NUL-terminated.
pub fn parse_nodata(raw: &str) -> Option<f32> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" => Some(f32::NAN),
        other => other.parse().ok(),
    }
}

fn decode_samples(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f32::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
    }
}
