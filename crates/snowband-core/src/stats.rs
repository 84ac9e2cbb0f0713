//! Per-cell band statistics and fixed-width record padding.
use serde::Serialize;

use crate::bands::discretize;
use crate::Result;

/// One populated elevation band of a cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandStat {
    /// Lower edge (inclusive), metres.
    pub lower: i64,
    /// Upper edge (exclusive), metres.
    pub upper: i64,
    pub pixels: usize,
    /// Share of the cell's assigned pixels, 0–1.
    pub fraction: f64,
    /// Mean of the untruncated elevations in the band.
    pub mean_elevation: f64,
}

/// Populated bands of one cell, ascending by elevation.
///
/// Empty for a degenerate cell (no valid elevation).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellBands {
    pub bands: Vec<BandStat>,
}

impl CellBands {
    /// Discretize `values` and summarise every populated band.
    pub fn from_block(values: &[f32], interval: u32) -> Result<Self> {
        let Some(disc) = discretize(values, interval)? else {
            return Ok(Self::default());
        };

        let n_bands = disc.edges.band_count();
        let mut counts = vec![0usize; n_bands];
        let mut sums = vec![0f64; n_bands];
        for (v, a) in values.iter().zip(&disc.assignment) {
            if let Some(b) = *a {
                counts[b] += 1;
                sums[b] += f64::from(*v);
            }
        }

        let total: usize = counts.iter().sum();
        let bands = disc
            .populated_bands()
            .into_iter()
            .map(|b| {
                let (lower, upper) = disc.edges.bounds(b);
                BandStat {
                    lower,
                    upper,
                    pixels: counts[b],
                    fraction: ratio(counts[b] as f64, total as f64),
                    mean_elevation: ratio(sums[b], counts[b] as f64),
                }
            })
            .collect();
        Ok(Self { bands })
    }

    /// Number of populated bands.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_degenerate(&self) -> bool {
        self.bands.is_empty()
    }

    /// Pad to `width` band slots. Slots past the populated bands are zero.
    ///
    /// `width` is the domain band ceiling, so it is never smaller than
    /// `self.len()`; extra populated bands would be dropped.
    pub fn record(&self, cell_id: u64, width: usize) -> CellRecord {
        let mut fractions = vec![0.0; width];
        let mut mean_elevations = vec![0.0; width];
        for (slot, band) in self.bands.iter().take(width).enumerate() {
            fractions[slot] = band.fraction;
            mean_elevations[slot] = band.mean_elevation;
        }
        CellRecord {
            cell_id,
            fractions,
            mean_elevations,
        }
    }
}

/// Zero-denominator division yields 0.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// One output line: id plus `N` area fractions and `N` mean elevations.
///
/// The precipitation fraction block of the file format repeats `fractions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellRecord {
    pub cell_id: u64,
    pub fractions: Vec<f64>,
    pub mean_elevations: Vec<f64>,
}

impl CellRecord {
    pub fn precip_fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn width(&self) -> usize {
        self.fractions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn reference_cell_fractions_and_means() {
        let cell = CellBands::from_block(&[5.0, 12.0, 18.0, 25.0], 10).unwrap();
        assert_eq!(cell.len(), 3);
        let fractions: Vec<f64> = cell.bands.iter().map(|b| b.fraction).collect();
        assert_eq!(fractions, vec![0.25, 0.5, 0.25]);
        assert_abs_diff_eq!(cell.bands[0].mean_elevation, 5.0);
        assert_abs_diff_eq!(cell.bands[1].mean_elevation, 15.0);
        assert_abs_diff_eq!(cell.bands[2].mean_elevation, 25.0);
    }

    #[test]
    fn populated_bands_are_packed_into_leading_slots() {
        // Bands 0 and 3 populated, 1 and 2 empty.
        let cell = CellBands::from_block(&[2.0, 4.0, 33.0, 37.0], 10).unwrap();
        let rec = cell.record(7, 4);
        assert_eq!(rec.cell_id, 7);
        assert_eq!(rec.fractions, vec![0.5, 0.5, 0.0, 0.0]);
        assert_eq!(rec.mean_elevations, vec![3.0, 35.0, 0.0, 0.0]);
    }

    #[test]
    fn degenerate_cell_pads_to_zero() {
        let cell = CellBands::from_block(&[f32::NAN; 9], 50).unwrap();
        assert!(cell.is_degenerate());
        let rec = cell.record(1, 3);
        assert_eq!(rec.fractions, vec![0.0; 3]);
        assert_eq!(rec.mean_elevations, vec![0.0; 3]);
    }

    #[test]
    fn fractions_sum_to_one_ignoring_nan() {
        let values = [812.0, f32::NAN, 845.5, 903.2, 911.0, f32::NAN, 1002.7, 1110.0];
        let cell = CellBands::from_block(&values, 100).unwrap();
        let sum: f64 = cell.bands.iter().map(|b| b.fraction).sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-12);
        assert_eq!(cell.bands.iter().map(|b| b.pixels).sum::<usize>(), 6);
    }

    #[test]
    fn band_means_lie_inside_band_edges() {
        let values: Vec<f32> = (0..64).map(|i| 1200.0 + (i as f32 * 7.3) % 410.0).collect();
        let cell = CellBands::from_block(&values, 50).unwrap();
        for b in &cell.bands {
            assert!(b.mean_elevation >= b.lower as f64, "{b:?}");
            assert!(b.mean_elevation < b.upper as f64, "{b:?}");
        }
    }

    #[test]
    fn precip_block_duplicates_area_fractions() {
        let rec = CellBands::from_block(&[5.0, 12.0, 18.0, 25.0], 10).unwrap().record(1, 5);
        assert_eq!(rec.precip_fractions(), rec.fractions.as_slice());
        assert_eq!(rec.width(), 5);
    }

    #[test]
    fn negative_fractional_cell_is_not_degenerate() {
        let cell = CellBands::from_block(&[-10.5], 10).unwrap();
        assert!(!cell.is_degenerate());
        assert_eq!((cell.bands[0].lower, cell.bands[0].upper), (-20, -10));
        assert_abs_diff_eq!(cell.bands[0].fraction, 1.0);
        assert_abs_diff_eq!(cell.bands[0].mean_elevation, -10.5);
    }
}
