//! Tab-delimited snow-band parameter file writer.
//!
//! Line layout (N = domain band ceiling):
//!   cell_id, N area fractions, N mean elevations, N precipitation fractions
//! Floating values use four decimals. The precipitation block repeats the
//! area fractions; consumers read it positionally.
use std::io::Write;

use crate::stats::CellRecord;

/// Static header line. The band count is not part of it; readers infer `N`
/// from the line width, `(fields - 1) / 3`.
pub const HEADER: &str = "#CELL_ID\tAREA_FRACT[1..N]\tELEVATION[1..N]\tPFACTOR[1..N]";

pub struct RecordWriter<W: Write> {
    out: W,
    records: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    pub fn write_header(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "{HEADER}")
    }

    pub fn write_record(&mut self, rec: &CellRecord) -> std::io::Result<()> {
        write!(self.out, "{}", rec.cell_id)?;
        let blocks = [rec.fractions.as_slice(), rec.mean_elevations.as_slice(), rec.precip_fractions()];
        for v in blocks.into_iter().flatten() {
            write!(self.out, "\t{v:.4}")?;
        }
        writeln!(self.out)?;
        self.records += 1;
        Ok(())
    }

    /// Records written so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
