//! End-to-end runs against in-memory rasters and a real output file.

use approx::assert_abs_diff_eq;
use snowband_core::{
    extract_cell, CellBands, GeoTransform, PassStrategy, Raster, SnowbandConfig, SnowbandEngine, SnowbandError,
    HEADER,
};

const NODATA: f32 = -9999.0;

/// Coarse 0.05° grid over a 0.05/8° DEM: 8×8 fine pixels per cell.
fn synthetic_domain(grid_w: usize, grid_h: usize) -> (Raster, Raster) {
    let ratio = 8;
    let coarse = GeoTransform::new(-85.0, 35.0, 0.05, -0.05);
    let fine = GeoTransform::new(-85.0, 35.0, 0.05 / ratio as f64, -0.05 / ratio as f64);

    // Checkerboard-ish mask with a few inactive cells.
    let mask_data = (0..grid_w * grid_h)
        .map(|i| if i % 5 == 3 { 0.0 } else { 1.0 })
        .collect();
    let mask = Raster::from_vec(mask_data, grid_w, grid_h, coarse).unwrap();

    let fw = grid_w * ratio;
    let fh = grid_h * ratio;
    let mut dem = Raster::filled(fw, fh, fine, 0.0).with_nodata(Some(NODATA));
    for r in 0..fh {
        for c in 0..fw {
            // Relief grows to the south-east; a nodata strip down column 3.
            let z = 150.0 + r as f32 * 11.7 + c as f32 * 4.3 + ((r * 7 + c * 3) % 13) as f32;
            dem.set(r, c, if c == 3 { NODATA } else { z });
        }
    }
    // One fully nodata cell.
    for r in 8..16 {
        for c in 8..16 {
            dem.set(r, c, NODATA);
        }
    }
    (mask, dem)
}

fn parse_rows(text: &str) -> Vec<Vec<f64>> {
    text.lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split('\t').map(|f| f.parse().unwrap()).collect())
        .collect()
}

#[test]
fn written_file_satisfies_record_invariants() {
    let (mask, dem) = synthetic_domain(6, 5);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snow.param");

    let engine = SnowbandEngine::new(SnowbandConfig::with_interval(50)).unwrap();
    let summary = engine.run_to_path(&mask, &dem, &out).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();

    assert_eq!(text.lines().next(), Some(HEADER));
    let rows = parse_rows(&text);
    let n = summary.band_ceiling;
    assert!(n >= 2);
    assert_eq!(rows.len() as u64, summary.records_written);
    assert_eq!(summary.records_written as usize, summary.active_cells);
    assert_eq!(summary.degenerate_cells, 1);

    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.len(), 1 + 3 * n);
        assert_eq!(row[0] as usize, i + 1);

        let fractions = &row[1..1 + n];
        let precip = &row[1 + 2 * n..];
        assert_eq!(fractions, precip);

        let sum: f64 = fractions.iter().sum();
        if sum != 0.0 {
            // Four-decimal rounding per slot.
            assert_abs_diff_eq!(sum, 1.0, epsilon = 5e-4 * n as f64);
        }
    }
}

#[test]
fn ceiling_equals_widest_cell() {
    let (mask, dem) = synthetic_domain(4, 4);
    let engine = SnowbandEngine::new(SnowbandConfig::with_interval(25)).unwrap();
    let domain = engine.prepare(mask, dem).unwrap();

    let widest = domain
        .cells
        .iter()
        .map(|&c| CellBands::from_block(&extract_cell(&domain.elevation, c, domain.ratio).values, 25).unwrap().len())
        .max()
        .unwrap();

    let summary = engine.run(&domain, std::io::sink()).unwrap();
    assert_eq!(summary.band_ceiling, widest);
}

#[test]
fn band_means_stay_inside_their_bands() {
    let (mask, dem) = synthetic_domain(4, 3);
    let engine = SnowbandEngine::new(SnowbandConfig::with_interval(40)).unwrap();
    let domain = engine.prepare(mask, dem).unwrap();
    for &cell in &domain.cells {
        let block = extract_cell(&domain.elevation, cell, domain.ratio);
        for band in CellBands::from_block(&block.values, 40).unwrap().bands {
            assert!(band.mean_elevation >= band.lower as f64);
            assert!(band.mean_elevation < band.upper as f64);
        }
    }
}

#[test]
fn strategies_and_reruns_are_byte_identical() {
    let (mask, dem) = synthetic_domain(5, 4);
    let dir = tempfile::tempdir().unwrap();

    let mut outputs = Vec::new();
    for (i, strategy) in [PassStrategy::TwoPass, PassStrategy::TwoPass, PassStrategy::Buffered]
        .into_iter()
        .enumerate()
    {
        let cfg = SnowbandConfig {
            strategy,
            ..SnowbandConfig::with_interval(30)
        };
        let path = dir.path().join(format!("run{i}.param"));
        SnowbandEngine::new(cfg).unwrap().run_to_path(&mask, &dem, &path).unwrap();
        outputs.push(std::fs::read(&path).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0], outputs[2]);
}

#[test]
fn existing_output_is_replaced() {
    let (mask, dem) = synthetic_domain(2, 2);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snow.param");
    std::fs::write(&out, "stale contents that are much longer than one header line\n".repeat(500)).unwrap();

    SnowbandEngine::new(SnowbandConfig::with_interval(50))
        .unwrap()
        .run_to_path(&mask, &dem, &out)
        .unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    assert!(!text.contains("stale"));
}

#[test]
fn configuration_error_leaves_no_output() {
    let (mask, dem) = synthetic_domain(2, 2);
    let mut dem = dem;
    dem.transform.pixel_width = 0.05 / 7.5;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("snow.param");
    let err = SnowbandEngine::new(SnowbandConfig::with_interval(50))
        .unwrap()
        .run_to_path(&mask, &dem, &out)
        .unwrap_err();
    assert!(matches!(err, SnowbandError::NonIntegralRatio { .. }));
    assert!(err.is_configuration());
    assert!(!out.exists());
}
