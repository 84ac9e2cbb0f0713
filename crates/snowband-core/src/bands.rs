//! Equal-interval elevation band discretization for a single cell.
//!
//! Band limits are derived from the integer-truncated extremes of the valid
//! pixels:
//!   minBand = min − (min mod interval)
//!   maxBand = max + (max mod interval)
//! Edges step from minBand by `interval` while below maxBand + interval, and
//! are extended by one step if the last edge does not lie strictly above the
//! largest valid value, or if the first edge lies above the smallest one.
//! Each valid pixel belongs to the half-open band `[edge[b], edge[b+1])`;
//! NaN and infinite pixels belong to none.

use crate::{Result, SnowbandError};

/// Band thresholds for one cell. Strictly increasing, at least two entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandEdges(Vec<i64>);

impl BandEdges {
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// Number of bands (edges − 1).
    pub fn band_count(&self) -> usize {
        self.0.len() - 1
    }

    /// `[lower, upper)` of band `b`.
    pub fn bounds(&self, b: usize) -> (i64, i64) {
        (self.0[b], self.0[b + 1])
    }
}

/// Band edges plus per-pixel band membership for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    pub edges: BandEdges,
    /// Same length and order as the input block; `None` for invalid pixels.
    pub assignment: Vec<Option<usize>>,
}

impl Discretization {
    /// Indices of bands holding at least one pixel, ascending.
    pub fn populated_bands(&self) -> Vec<usize> {
        let mut seen = vec![false; self.edges.band_count()];
        for b in self.assignment.iter().flatten() {
            seen[*b] = true;
        }
        seen.iter()
            .enumerate()
            .filter_map(|(b, &hit)| hit.then_some(b))
            .collect()
    }

    /// Pixels with a band assignment.
    pub fn assigned_count(&self) -> usize {
        self.assignment.iter().filter(|a| a.is_some()).count()
    }
}

/// Largest elevation magnitude accepted for banding. Anything beyond is a
/// fill value that slipped past nodata masking.
pub const MAX_ABS_ELEVATION: f64 = 1.0e9;

/// Upper bound on the bands of a single discretization.
pub const MAX_BANDS: i64 = 1_000_000;

/// Smallest and largest finite value, or `None` if there is none.
fn finite_extremes(values: &[f32]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| f64::from(v))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// `(minBand, maxBand)` for valid elevations spanning `[lo, hi]`.
fn band_limits(lo: f64, hi: f64, interval: u32) -> Result<(i64, i64)> {
    let out_of_range = || SnowbandError::BandRange {
        min: lo,
        max: hi,
        interval,
    };
    if !(lo.abs() <= MAX_ABS_ELEVATION && hi.abs() <= MAX_ABS_ELEVATION) {
        return Err(out_of_range());
    }
    // Bounded magnitudes keep every edge below well inside i64.
    let step = i64::from(interval);
    let min_t = lo.trunc() as i64;
    let max_t = hi.trunc() as i64;
    let min_band = min_t - min_t.rem_euclid(step);
    let max_band = max_t + max_t.rem_euclid(step);
    // One edge may be prepended and one appended below.
    if (max_band - min_band) / step + 3 > MAX_BANDS {
        return Err(out_of_range());
    }
    Ok((min_band, max_band))
}

/// Fail early if any cell drawn from `values` could not be discretized.
///
/// Every cell's valid range lies inside the range of the whole raster, so a
/// raster that passes never makes [`discretize`] fail.
pub fn check_band_range(values: &[f32], interval: u32) -> Result<()> {
    match finite_extremes(values) {
        Some((lo, hi)) => band_limits(lo, hi, interval).map(|_| ()),
        None => Ok(()),
    }
}

/// Discretize one cell's elevations into `interval`-high bands.
///
/// Returns `Ok(None)` when the block holds no valid (finite) elevation, and
/// [`SnowbandError::BandRange`] when the valid values are out of range.
/// `interval` must be positive; the engine validates it up front.
pub fn discretize(values: &[f32], interval: u32) -> Result<Option<Discretization>> {
    debug_assert!(interval > 0);
    let Some((min_v, max_v)) = finite_extremes(values) else {
        return Ok(None);
    };
    let (min_band, max_band) = band_limits(min_v, max_v, interval)?;
    let step = i64::from(interval);

    let mut edges = Vec::new();
    let mut e = min_band;
    while e < max_band + step {
        edges.push(e);
        e += step;
    }
    // Truncation toward zero lifts negative fractional minima above minBand.
    if (min_band as f64) > min_v {
        edges.insert(0, min_band - step);
    }
    // min_band <= max_band, so `edges` is never empty here.
    while edges.len() < 2 || (edges[edges.len() - 1] as f64) <= max_v {
        let last = edges[edges.len() - 1];
        edges.push(last + step);
    }

    let first = edges[0] as f64;
    let band_count = edges.len() - 1;
    let assignment = values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                return None;
            }
            let b = ((f64::from(v) - first) / step as f64).floor();
            (b >= 0.0 && (b as usize) < band_count).then_some(b as usize)
        })
        .collect();

    Ok(Some(Discretization {
        edges: BandEdges(edges),
        assignment,
    }))
}
