//! Domain band ceiling: the widest band count of any active cell.
//!
//! Every output record carries exactly this many band slots, so it has to be
//! known before the first record is written.
use crate::bands::discretize;
use crate::engine::{map_cells, Domain};
use crate::extract::extract_cell;
use crate::stats::CellBands;
use crate::Result;

/// Discretize every active cell in scan order and return the largest number
/// of populated bands. Cells without valid elevation count as zero.
pub fn resolve_band_ceiling(domain: &Domain, interval: u32) -> Result<usize> {
    map_cells(&domain.cells, |cell| {
        let block = extract_cell(&domain.elevation, cell, domain.ratio);
        discretize(&block.values, interval).map(|d| d.map_or(0, |d| d.populated_bands().len()))
    })
    .into_iter()
    .try_fold(0, |ceiling, bands| bands.map(|n| ceiling.max(n)))
}

/// Ceiling over already-computed cell statistics.
pub fn band_ceiling<'a, I>(cells: I) -> usize
where
    I: IntoIterator<Item = &'a CellBands>,
{
    cells.into_iter().map(CellBands::len).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnowbandConfig;
    use crate::engine::SnowbandEngine;
    use crate::raster::{GeoTransform, Raster};

    /// 2×2 coarse grid over a 4×4 DEM, ratio 2.
    fn domain(mask: [f32; 4], dem: [f32; 16]) -> Domain {
        let mask = Raster::from_vec(mask.to_vec(), 2, 2, GeoTransform::new(0.0, 4.0, 2.0, -2.0)).unwrap();
        let dem = Raster::from_vec(dem.to_vec(), 4, 4, GeoTransform::new(0.0, 4.0, 1.0, -1.0)).unwrap();
        SnowbandEngine::new(SnowbandConfig::with_interval(10))
            .unwrap()
            .prepare(mask, dem)
            .unwrap()
    }

    #[rustfmt::skip]
    const DEM: [f32; 16] = [
        5.0, 12.0,   100.0, 101.0,
        18.0, 25.0,  102.0, 103.0,
        1.0, 45.0,   f32::NAN, f32::NAN,
        2.0, 3.0,    f32::NAN, f32::NAN,
    ];

    #[test]
    fn ceiling_is_max_over_active_cells() {
        // Cell bands: (0,0) -> 3, (0,1) -> 1, (1,0) -> 2, (1,1) -> 0.
        let d = domain([1.0, 1.0, 1.0, 1.0], DEM);
        assert_eq!(resolve_band_ceiling(&d, 10).unwrap(), 3);
    }

    #[test]
    fn inactive_cells_do_not_widen_ceiling() {
        let d = domain([0.0, 1.0, 1.0, 1.0], DEM);
        assert_eq!(resolve_band_ceiling(&d, 10).unwrap(), 2);
    }

    #[test]
    fn single_active_cell_sets_ceiling() {
        let d = domain([0.0, 0.0, 1.0, 0.0], DEM);
        assert_eq!(resolve_band_ceiling(&d, 10).unwrap(), 2);
    }

    #[test]
    fn all_degenerate_domain_has_zero_ceiling() {
        let d = domain([0.0, 0.0, 0.0, 1.0], DEM);
        assert_eq!(resolve_band_ceiling(&d, 10).unwrap(), 0);
    }

    #[test]
    fn buffered_ceiling_matches_resolver() {
        let d = domain([1.0, 1.0, 1.0, 1.0], DEM);
        let cells: Vec<CellBands> = d
            .cells
            .iter()
            .map(|&c| CellBands::from_block(&extract_cell(&d.elevation, c, d.ratio).values, 10).unwrap())
            .collect();
        assert_eq!(band_ceiling(&cells), resolve_band_ceiling(&d, 10).unwrap());
    }
}
