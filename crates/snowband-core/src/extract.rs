//! Active-cell enumeration and fine sub-block extraction.
use serde::{Deserialize, Serialize};

use crate::raster::Raster;
use crate::resolution::ResolutionRatio;

/// Mask value marking a cell inside the basin.
pub const ACTIVE_VALUE: f32 = 1.0;

/// A coarse grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

impl CellIndex {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Fine elevation pixels enclosed by one coarse cell, row-major.
///
/// Border cells whose block runs past the fine raster are clipped, so a block
/// may be smaller than `ratio.x × ratio.y` or empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SubBlock {
    pub values: Vec<f32>,
    pub rows: usize,
    pub cols: usize,
}

/// How complete a cell's block is relative to the full ratio × ratio shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockExtent {
    Full,
    Truncated,
    Empty,
}

impl SubBlock {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn extent(&self, ratio: ResolutionRatio) -> BlockExtent {
        if self.values.is_empty() {
            BlockExtent::Empty
        } else if self.rows < ratio.y || self.cols < ratio.x {
            BlockExtent::Truncated
        } else {
            BlockExtent::Full
        }
    }
}

/// Active cells of `mask` in row-major scan order.
pub fn active_cells(mask: &Raster) -> Vec<CellIndex> {
    let mut cells = Vec::new();
    for row in 0..mask.height {
        for col in 0..mask.width {
            if mask.get(row, col) == ACTIVE_VALUE {
                cells.push(CellIndex { row, col });
            }
        }
    }
    cells
}

/// Slice the fine pixels under `cell`. A pure function of its inputs: no
/// state carries over from one cell to the next.
pub fn extract_cell(fine: &Raster, cell: CellIndex, ratio: ResolutionRatio) -> SubBlock {
    let row_start = (cell.row * ratio.y).min(fine.height);
    let row_end = ((cell.row + 1) * ratio.y).min(fine.height);
    let col_start = (cell.col * ratio.x).min(fine.width);
    let col_end = ((cell.col + 1) * ratio.x).min(fine.width);

    let rows = row_end - row_start;
    let cols = col_end - col_start;
    if rows == 0 || cols == 0 {
        return SubBlock {
            values: Vec::new(),
            rows: 0,
            cols: 0,
        };
    }

    let mut values = Vec::with_capacity(rows * cols);
    for r in row_start..row_end {
        values.extend_from_slice(fine.row_span(r, col_start..col_end));
    }
    SubBlock { values, rows, cols }
}
