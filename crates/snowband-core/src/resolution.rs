//! Coarse/fine resolution reconciliation.
//!
//! The coarse (model) grid pixel must be an exact integer multiple of the
//! fine (DEM) pixel on each axis, and both rasters must share an origin so
//! that coarse cell (r, c) covers fine rows `r*ratio.y..` and columns
//! `c*ratio.x..` by pure index arithmetic.
use serde::{Deserialize, Serialize};

use crate::error::Axis;
use crate::raster::GeoTransform;
use crate::{Result, SnowbandError};

/// Number of fine pixels per coarse pixel along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRatio {
    pub x: usize,
    pub y: usize,
}

impl ResolutionRatio {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn square(n: usize) -> Self {
        Self { x: n, y: n }
    }

    /// Fine pixels in one full (untruncated) cell block.
    pub fn block_len(&self) -> usize {
        self.x * self.y
    }
}

/// Tolerances for [`reconcile`].
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Allowed |ratio·fine − coarse|, in fine pixels.
    pub ratio_tolerance: f64,
    /// Verify that both rasters start at the same corner.
    pub check_alignment: bool,
    /// Allowed origin offset, in fine pixels.
    pub alignment_tolerance: f64,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            ratio_tolerance: 1e-3,
            check_alignment: true,
            alignment_tolerance: 0.1,
        }
    }
}

/// Compute the integer resolution ratio between `coarse` and `fine`.
pub fn reconcile(coarse: &GeoTransform, fine: &GeoTransform, opts: &ReconcileOptions) -> Result<ResolutionRatio> {
    let (coarse_x, coarse_y) = coarse.resolution();
    let (fine_x, fine_y) = fine.resolution();

    let x = axis_ratio(Axis::X, coarse_x, fine_x, opts.ratio_tolerance)?;
    let y = axis_ratio(Axis::Y, coarse_y, fine_y, opts.ratio_tolerance)?;

    if opts.check_alignment {
        check_origin(Axis::X, coarse.origin_x, fine.origin_x, fine_x * opts.alignment_tolerance)?;
        check_origin(Axis::Y, coarse.origin_y, fine.origin_y, fine_y * opts.alignment_tolerance)?;
    }

    Ok(ResolutionRatio { x, y })
}

fn axis_ratio(axis: Axis, coarse: f64, fine: f64, tolerance: f64) -> Result<usize> {
    let raw = coarse / fine;
    let non_integral = || SnowbandError::NonIntegralRatio {
        axis,
        coarse,
        fine,
        ratio: raw,
    };

    if !(coarse > 0.0 && fine > 0.0) || !raw.is_finite() {
        return Err(non_integral());
    }
    let rounded = raw.round();
    if rounded < 1.0 || (rounded * fine - coarse).abs() > tolerance * fine {
        return Err(non_integral());
    }
    Ok(rounded as usize)
}

fn check_origin(axis: Axis, coarse_origin: f64, fine_origin: f64, tolerance: f64) -> Result<()> {
    if (coarse_origin - fine_origin).abs() > tolerance {
        return Err(SnowbandError::Misaligned {
            axis,
            coarse_origin,
            fine_origin,
        });
    }
    Ok(())
}
