//! # snowband-core
//!
//! Elevation sub-grid banding for snow-band model parameters.
//!
//! For every active cell of a coarse model grid the fine-resolution DEM
//! pixels underneath are split into equal-height elevation bands. Each cell
//! gets one record with the areal fraction and mean elevation of its bands,
//! padded to the widest band count found anywhere in the domain.
//!
//! ```no_run
//! use std::path::Path;
//! use snowband_core::{GeoTiffSource, SnowbandConfig, SnowbandEngine};
//!
//! let engine = SnowbandEngine::new(SnowbandConfig::with_interval(100))?;
//! let summary = engine.run_to_path(
//!     &GeoTiffSource::new("grid.tif"),
//!     &GeoTiffSource::new("dem.tif"),
//!     Path::new("snow.param"),
//! )?;
//! println!("snow bands: {}", summary.band_ceiling);
//! # Ok::<(), snowband_core::SnowbandError>(())
//! ```

pub mod bands;
pub mod ceiling;
pub mod config;
pub mod engine;
mod error;
pub mod extract;
pub mod geotiff;
pub mod raster;
pub mod resolution;
pub mod stats;
pub mod writer;

pub use bands::{check_band_range, discretize, BandEdges, Discretization};
pub use ceiling::{band_ceiling, resolve_band_ceiling};
pub use config::{EmptyBlockPolicy, PassStrategy, SnowbandConfig};
pub use engine::{Domain, RunSummary, SnowbandEngine};
pub use error::{Axis, SnowbandError};
pub use extract::{active_cells, extract_cell, CellIndex, SubBlock};
pub use geotiff::GeoTiffSource;
pub use raster::{GeoTransform, Raster, RasterSource};
pub use resolution::{reconcile, ReconcileOptions, ResolutionRatio};
pub use stats::{BandStat, CellBands, CellRecord};
pub use writer::{RecordWriter, HEADER};

/// Result type for banding operations.
pub type Result<T> = std::result::Result<T, SnowbandError>;
