//! Run orchestration: reconcile inputs, resolve the band ceiling, write one
//! padded record per active cell.
//!
//! Cells are independent, so within a pass they are computed in parallel
//! when the `threading` feature is on. Results are always collected in scan
//! order and written from a single thread, which keeps cell ids and output
//! bytes deterministic.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bands::check_band_range;
use crate::ceiling::{band_ceiling, resolve_band_ceiling};
use crate::config::{EmptyBlockPolicy, PassStrategy, SnowbandConfig};
use crate::extract::{active_cells, extract_cell, BlockExtent, CellIndex};
use crate::raster::{Raster, RasterSource};
use crate::resolution::{reconcile, ResolutionRatio};
use crate::stats::CellBands;
use crate::writer::RecordWriter;
use crate::Result;

/// Cells computed per parallel batch in the two-pass writer.
const WRITE_BATCH: usize = 4096;

/// Reconciled inputs of one run.
#[derive(Debug, Clone)]
pub struct Domain {
    /// Fine elevations with every missing value as NaN.
    pub elevation: Raster,
    pub ratio: ResolutionRatio,
    /// Active coarse cells, row-major.
    pub cells: Vec<CellIndex>,
    pub grid_width: usize,
    pub grid_height: usize,
}

/// Outcome counters of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub interval: u32,
    pub ratio: ResolutionRatio,
    pub strategy: PassStrategy,
    pub active_cells: usize,
    pub records_written: u64,
    /// Band slots per record (N).
    pub band_ceiling: usize,
    /// Records written with all-zero bands.
    pub degenerate_cells: usize,
    /// Border cells whose block was clipped by the elevation raster.
    pub truncated_cells: usize,
    /// Cells whose block lay entirely outside the elevation raster.
    pub empty_blocks: usize,
    /// Cells with no record (empty blocks under the skip policy).
    pub skipped_cells: usize,
}

struct CellResult {
    cell: CellIndex,
    extent: BlockExtent,
    /// `None` when the cell is skipped.
    bands: Option<CellBands>,
}

pub struct SnowbandEngine {
    config: SnowbandConfig,
}

impl SnowbandEngine {
    pub fn new(config: SnowbandConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SnowbandConfig {
        &self.config
    }

    /// Reconcile resolutions, mask invalid elevations and list active cells.
    ///
    /// Fails if the remaining elevations cannot be banded at the configured
    /// interval, so a prepared domain never fails mid-write.
    pub fn prepare(&self, mask: Raster, mut elevation: Raster) -> Result<Domain> {
        let ratio = reconcile(&mask.transform, &elevation.transform, &self.config.reconcile_options())?;
        let masked = elevation.sanitize_elevation(self.config.min_valid_elevation);
        check_band_range(&elevation.data, self.config.interval)?;
        let cells = active_cells(&mask);

        if let Some((covered_w, covered_h)) = extent_mismatch(&mask, &elevation, ratio) {
            warn!(
                grid = %format!("{}x{}", mask.width, mask.height),
                covered = %format!("{covered_w}x{covered_h}"),
                elevation = %format!("{}x{}", elevation.width, elevation.height),
                "elevation extent differs from grid extent × ratio; border cells will be clipped or empty"
            );
        }

        info!(
            grid_width = mask.width,
            grid_height = mask.height,
            ratio_x = ratio.x,
            ratio_y = ratio.y,
            active = cells.len(),
            masked_pixels = masked,
            "prepared banding domain"
        );

        Ok(Domain {
            elevation,
            ratio,
            cells,
            grid_width: mask.width,
            grid_height: mask.height,
        })
    }

    /// Write the parameter file for `domain` to `out`.
    pub fn run<W: Write>(&self, domain: &Domain, out: W) -> Result<RunSummary> {
        let interval = self.config.interval;
        let mut writer = RecordWriter::new(out);
        if self.config.write_header {
            writer.write_header()?;
        }

        let mut summary = RunSummary {
            interval,
            ratio: domain.ratio,
            strategy: self.config.strategy,
            active_cells: domain.cells.len(),
            records_written: 0,
            band_ceiling: 0,
            degenerate_cells: 0,
            truncated_cells: 0,
            empty_blocks: 0,
            skipped_cells: 0,
        };

        match self.config.strategy {
            PassStrategy::TwoPass => {
                let ceiling = resolve_band_ceiling(domain, interval)?;
                debug!(ceiling, "pass 1 complete");
                summary.band_ceiling = ceiling;
                for batch in domain.cells.chunks(WRITE_BATCH) {
                    for result in map_cells(batch, |cell| self.process_cell(domain, cell)) {
                        emit(&mut writer, &mut summary, result?, ceiling)?;
                    }
                }
            }
            PassStrategy::Buffered => {
                let results = map_cells(&domain.cells, |cell| self.process_cell(domain, cell))
                    .into_iter()
                    .collect::<Result<Vec<_>>>()?;
                let ceiling = band_ceiling(results.iter().filter_map(|r| r.bands.as_ref()));
                summary.band_ceiling = ceiling;
                for result in results {
                    emit(&mut writer, &mut summary, result, ceiling)?;
                }
            }
        }

        summary.records_written = writer.records();
        writer.finish()?;

        info!(
            records = summary.records_written,
            degenerate = summary.degenerate_cells,
            skipped = summary.skipped_cells,
            "maximum number of snow bands: {}",
            summary.band_ceiling
        );
        Ok(summary)
    }

    /// Read both rasters, reconcile them, then create (or truncate) `path`
    /// and write the parameter file. Configuration errors surface before the
    /// file is touched.
    pub fn run_to_path(
        &self,
        mask: &dyn RasterSource,
        elevation: &dyn RasterSource,
        path: &Path,
    ) -> Result<RunSummary> {
        let domain = self.prepare(mask.read_band()?, elevation.read_band()?)?;
        let file = File::create(path)?;
        self.run(&domain, BufWriter::new(file))
    }

    fn process_cell(&self, domain: &Domain, cell: CellIndex) -> Result<CellResult> {
        let block = extract_cell(&domain.elevation, cell, domain.ratio);
        let extent = block.extent(domain.ratio);
        let bands = match (extent, self.config.empty_block_policy) {
            (BlockExtent::Empty, EmptyBlockPolicy::Skip) => None,
            _ => Some(CellBands::from_block(&block.values, self.config.interval)?),
        };
        Ok(CellResult { cell, extent, bands })
    }
}

fn emit<W: Write>(
    writer: &mut RecordWriter<W>,
    summary: &mut RunSummary,
    result: CellResult,
    ceiling: usize,
) -> std::io::Result<()> {
    let CellIndex { row, col } = result.cell;
    match result.extent {
        BlockExtent::Full => {}
        BlockExtent::Truncated => {
            summary.truncated_cells += 1;
            debug!(row, col, "cell block clipped at elevation raster edge");
        }
        BlockExtent::Empty => {
            summary.empty_blocks += 1;
            warn!(row, col, "cell block lies outside the elevation raster");
        }
    }

    let Some(bands) = result.bands else {
        summary.skipped_cells += 1;
        return Ok(());
    };
    if bands.is_degenerate() {
        summary.degenerate_cells += 1;
        if result.extent != BlockExtent::Empty {
            warn!(row, col, "cell has no valid elevation; writing zero bands");
        }
    }

    let cell_id = writer.records() + 1;
    writer.write_record(&bands.record(cell_id, ceiling))
}

/// Fine extent the grid spans at `ratio`, if the elevation raster differs.
fn extent_mismatch(mask: &Raster, elevation: &Raster, ratio: ResolutionRatio) -> Option<(usize, usize)> {
    let covered = (mask.width * ratio.x, mask.height * ratio.y);
    (covered != (elevation.width, elevation.height)).then_some(covered)
}

/// Apply `f` to every cell, returning results in the order of `cells`.
#[cfg(feature = "threading")]
pub(crate) fn map_cells<T, F>(cells: &[CellIndex], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(CellIndex) -> T + Sync + Send,
{
    use rayon::prelude::*;
    cells.par_iter().map(|&cell| f(cell)).collect()
}

/// Apply `f` to every cell, returning results in the order of `cells`.
#[cfg(not(feature = "threading"))]
pub(crate) fn map_cells<T, F>(cells: &[CellIndex], f: F) -> Vec<T>
where
    T: Send,
    F: Fn(CellIndex) -> T + Sync + Send,
{
    cells.iter().map(|&cell| f(cell)).collect()
}
