use serde::{Deserialize, Serialize};

use crate::{Result, SnowbandError};

/// Affine placement of a north-up raster: top-left origin plus signed pixel
/// sizes (pixel_height is normally negative for north-up data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Pixel size magnitudes (x, y).
    pub fn resolution(&self) -> (f64, f64) {
        (self.pixel_width.abs(), self.pixel_height.abs())
    }
}

/// A single-band raster storing samples as f32, row-major (north to south).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raster {
    /// Row-major sample values.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    /// Samples equal to this value are missing.
    pub nodata: Option<f32>,
}

impl Raster {
    /// Build a raster from row-major samples, checking the length.
    pub fn from_vec(data: Vec<f32>, width: usize, height: usize, transform: GeoTransform) -> Result<Self> {
        let expected = width * height;
        if data.len() != expected {
            return Err(SnowbandError::RasterShape {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            transform,
            nodata: None,
        })
    }

    /// Create a raster filled with the given value.
    pub fn filled(width: usize, height: usize, transform: GeoTransform, fill: f32) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
            transform,
            nodata: None,
        }
    }

    pub fn with_nodata(mut self, nodata: Option<f32>) -> Self {
        self.nodata = nodata;
        self
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f32) {
        self.data[row * self.width + col] = val;
    }

    /// Row `row`, columns `cols` as a slice.
    #[inline]
    pub fn row_span(&self, row: usize, cols: std::ops::Range<usize>) -> &[f32] {
        let start = row * self.width;
        &self.data[start + cols.start..start + cols.end]
    }

    /// Replace nodata samples, infinities, and samples below `min_valid`
    /// when given, with NaN. Returns the number of samples masked.
    ///
    /// After this call NaN is the only missing-value marker, so `nodata` is
    /// cleared.
    pub fn sanitize_elevation(&mut self, min_valid: Option<f32>) -> usize {
        let nodata = self.nodata.take();
        let mut masked = 0usize;
        for v in self.data.iter_mut() {
            if v.is_nan() {
                continue;
            }
            let is_nodata = nodata.is_some_and(|nd| *v == nd);
            let below = min_valid.is_some_and(|m| *v < m);
            if is_nodata || below || v.is_infinite() {
                *v = f32::NAN;
                masked += 1;
            }
        }
        masked
    }
}

/// Source of a single raster band plus its georeferencing.
///
/// This is the seam to whatever decodes files; the engine only ever sees the
/// resulting [`Raster`].
pub trait RasterSource {
    fn read_band(&self) -> Result<Raster>;
}

impl RasterSource for Raster {
    fn read_band(&self) -> Result<Raster> {
        Ok(self.clone())
    }
}
