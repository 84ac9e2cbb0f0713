//! Run configuration.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::resolution::ReconcileOptions;
use crate::{Result, SnowbandError};

/// What to do with an active cell whose fine block lies entirely outside
/// the elevation raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyBlockPolicy {
    /// Emit an all-zero record, keeping one id per active cell.
    #[default]
    Degenerate,
    /// Emit nothing; the cell consumes no id.
    Skip,
}

/// How the band ceiling is discovered before records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassStrategy {
    /// Pass 1 resolves the ceiling, pass 2 re-derives bands and writes.
    #[default]
    TwoPass,
    /// Compute every cell once, keep the results, pad after the ceiling is known.
    Buffered,
}

/// Parameters of one banding run. Loadable from JSON; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowbandConfig {
    /// Vertical band height in elevation units (metres). Must be > 0.
    pub interval: u32,
    /// Elevations below this are treated as missing (the sea-level cut).
    /// `None` keeps every non-nodata value.
    pub min_valid_elevation: Option<f32>,
    pub empty_block_policy: EmptyBlockPolicy,
    pub strategy: PassStrategy,
    /// Write the static header line before the records.
    pub write_header: bool,
    /// Allowed |ratio·fine − coarse| in fine pixels.
    pub ratio_tolerance: f64,
    pub check_alignment: bool,
    /// Allowed origin offset in fine pixels.
    pub alignment_tolerance: f64,
}

impl Default for SnowbandConfig {
    fn default() -> Self {
        let reconcile = ReconcileOptions::default();
        Self {
            interval: 100,
            min_valid_elevation: Some(0.0),
            empty_block_policy: EmptyBlockPolicy::default(),
            strategy: PassStrategy::default(),
            write_header: true,
            ratio_tolerance: reconcile.ratio_tolerance,
            check_alignment: reconcile.check_alignment,
            alignment_tolerance: reconcile.alignment_tolerance,
        }
    }
}

impl SnowbandConfig {
    pub fn with_interval(interval: u32) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SnowbandError::InputRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(SnowbandError::InvalidInterval(0));
        }
        if !(self.ratio_tolerance >= 0.0 && self.ratio_tolerance < 0.5) {
            return Err(SnowbandError::InvalidConfig(format!(
                "ratio_tolerance {} must be in [0, 0.5)",
                self.ratio_tolerance
            )));
        }
        if !(self.alignment_tolerance >= 0.0) {
            return Err(SnowbandError::InvalidConfig(format!(
                "alignment_tolerance {} must be >= 0",
                self.alignment_tolerance
            )));
        }
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            ratio_tolerance: self.ratio_tolerance,
            check_alignment: self.check_alignment,
            alignment_tolerance: self.alignment_tolerance,
        }
    }
}
