//! Error types for the snow-band engine.

use thiserror::Error;

/// Raster axis a resolution or alignment check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Errors that can occur while preparing or running a banding job.
#[derive(Debug, Error)]
pub enum SnowbandError {
    /// I/O error reading a raster or writing the parameter file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input raster or config file missing or unreadable.
    #[error("Cannot read {path}: {source}")]
    InputRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or malformed georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Unsupported sample type in the TIFF file.
    #[error("Unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// Pixel array length does not match the declared dimensions.
    #[error("Raster shape mismatch: {width}x{height} needs {expected} values, got {actual}")]
    RasterShape {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    /// Coarse pixel size is not an integer multiple of the fine pixel size.
    #[error("Coarse/fine resolution ratio on {axis} axis is not integral: {coarse} / {fine} = {ratio}")]
    NonIntegralRatio {
        axis: Axis,
        coarse: f64,
        fine: f64,
        ratio: f64,
    },

    /// Coarse grid and elevation raster origins do not coincide.
    #[error("Rasters are not aligned on {axis} axis: coarse origin {coarse_origin}, fine origin {fine_origin}")]
    Misaligned {
        axis: Axis,
        coarse_origin: f64,
        fine_origin: f64,
    },

    /// Band interval must be a positive integer.
    #[error("Invalid band interval {0} (must be > 0)")]
    InvalidInterval(u32),

    /// Valid elevations are too extreme, or span too many bands, to discretize.
    #[error("Elevation range {min}..{max} cannot be split into {interval}-unit bands")]
    BandRange { min: f64, max: f64, interval: u32 },

    /// Any other invalid run parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed JSON configuration.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl SnowbandError {
    /// True for errors that abort a run before any output is written.
    /// Plain I/O errors come from the output side and are not included.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, SnowbandError::Io(_))
    }
}
