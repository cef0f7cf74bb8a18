mod common;

use borehole_imager::coal::{FormationTop, FormationTops};
use borehole_imager::cutoff::Confidence;
use borehole_imager::image::io::{read_json_file, save_intensity_png, write_json_file};
use borehole_imager::tool::{ButtonId, DensityLog, RawChannelSet, ToolGeometry};
use borehole_imager::types::ParallelOptions;
use borehole_imager::{BoreholeImager, DepthRange, ImagerError, PipelineParams};
use common::synthetic_log::{depth_axis, raw_from_fn};

/// 3 m of an 8-pad tool with a 30 cm coal band at 501.0 m.
fn coal_log(geometry: &ToolGeometry) -> RawChannelSet {
    raw_from_fn(geometry, 500.0, 1500, 0.002, |d, _| {
        if (501.0..501.3).contains(&d) {
            15.0
        } else {
            150.0
        }
    })
}

fn tool() -> ToolGeometry {
    ToolGeometry::evenly_spaced(8, 24, 30.0)
}

#[test]
fn synthetic_log_end_to_end() {
    common::init_logger();
    let geometry = tool();
    let raw = coal_log(&geometry);
    let formations = FormationTops::new(vec![
        FormationTop {
            name: "Taroom".to_string(),
            top: 501.2,
        },
        FormationTop {
            name: "Juandah".to_string(),
            top: 499.0,
        },
    ]);

    let imager = BoreholeImager::new(geometry.clone(), PipelineParams::default());
    let res = imager.run(&raw, None, None, Some(&formations)).unwrap();

    assert_eq!(res.image_summary.rows, 1500);
    assert_eq!(res.image_summary.azimuth_bins, 360);
    assert!(
        (res.image_summary.coverage_fraction - geometry.expected_coverage()).abs() <= 8.0 / 360.0 + 1e-6,
        "coverage={}",
        res.image_summary.coverage_fraction
    );
    assert_eq!(res.cutoff.confidence, Confidence::Full);
    assert!(res.cutoff.cutoff > 0.0 && res.cutoff.cutoff < 255.0);

    assert_eq!(res.seams.len(), 1, "{:?}", res.seams);
    let seam = &res.seams[0];
    assert!((seam.top - 501.0).abs() < 0.01, "top={}", seam.top);
    assert!((seam.thickness - 0.3).abs() < 0.01, "thickness={}", seam.thickness);
    assert_eq!(seam.formation.as_deref(), Some("Juandah"));
    assert_eq!(res.coal_summary.seam_count, 1);
    assert!((res.coal_summary.gross_interval - 3.0).abs() < 1e-6);

    // Both band boundaries are full-circumference contrasts.
    let depths: Vec<f64> = res.features.beddings.iter().map(|b| b.depth).collect();
    assert_eq!(depths.len(), 2, "{depths:?}");
    assert!((depths[0] - 501.0).abs() < 0.01, "{depths:?}");
    assert!((depths[1] - 501.3).abs() < 0.01, "{depths:?}");
    assert!(res.features.fractures.is_empty(), "{:?}", res.features.fractures);
    assert!(res.features.faults.is_empty(), "{:?}", res.features.faults);

    assert!(res.qc.spacing.irregular_at.is_empty());
    assert_eq!(res.qc.channels.len(), 8 * 24);
    for label in ["qc", "normalize", "reconstruct", "intensity", "cutoff", "coal", "features"] {
        assert!(res.timings.stage_ms(label).is_some(), "missing stage {label}");
    }

    let json = serde_json::to_value(&res).unwrap();
    assert_eq!(json["seams"].as_array().map(Vec::len), Some(1));
    assert!(json.get("image").is_none());
}

#[test]
fn zone_restriction_and_exports() {
    common::init_logger();
    let geometry = tool();
    let raw = coal_log(&geometry);
    let zone = DepthRange::new(500.5, 501.5);
    let imager = BoreholeImager::new(geometry, PipelineParams::default());
    let res = imager.run(&raw, Some(zone), None, None).unwrap();

    assert!(res.image.depths[0] >= 500.5 - 1e-9);
    assert!(*res.image.depths.last().unwrap() <= 501.5 + 1e-9);
    assert_eq!(res.interval, Some(zone));
    assert_eq!(res.seams.len(), 1, "{:?}", res.seams);
    assert!((res.coal_summary.gross_interval - 1.0).abs() < 1e-9);
    let ntg = res.coal_summary.net_to_gross;
    assert!((ntg - 0.3).abs() < 0.02, "ntg={ntg}");

    let dir = std::env::temp_dir().join(format!("borehole-imager-e2e-{}", std::process::id()));
    let png = dir.join("image.png");
    save_intensity_png(&res.image.values, &res.image.coverage, &png).unwrap();
    assert!(png.exists());
    let report = dir.join("seams.json");
    write_json_file(&report, &res.seams).unwrap();
    let back: serde_json::Value = read_json_file(&report).unwrap();
    assert_eq!(back.as_array().map(Vec::len), Some(1));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn siderite_band_suppresses_the_seam() {
    common::init_logger();
    let geometry = tool();
    let raw = coal_log(&geometry);
    let depths = depth_axis(500.0, 31, 0.1);
    let density = depths
        .iter()
        .map(|&d| if (500.85..501.45).contains(&d) { 2.8 } else { 2.3 })
        .collect();
    let density = DensityLog::new(depths, density);

    let imager = BoreholeImager::new(geometry, PipelineParams::default());
    let res = imager.run(&raw, None, Some(&density), None).unwrap();
    assert!(res.seams.is_empty(), "{:?}", res.seams);
    assert!(res.coal_profile.excluded.iter().any(|&e| e));
}

#[test]
fn sequential_and_parallel_runs_agree() {
    common::init_logger();
    let geometry = tool();
    let raw = coal_log(&geometry);
    let run = |parallel: ParallelOptions| {
        let params = PipelineParams {
            parallel,
            ..PipelineParams::default()
        };
        BoreholeImager::new(geometry.clone(), params)
            .run(&raw, None, None, None)
            .unwrap()
    };
    let seq = run(ParallelOptions::disabled());
    let par = run(ParallelOptions::new(true, 1));
    assert_eq!(seq.image.values, par.image.values);
    assert_eq!(seq.image.coverage, par.image.coverage);
    assert_eq!(seq.seams, par.seams);
    assert_eq!(seq.features.beddings, par.features.beddings);
}

#[test]
fn missing_button_is_a_geometry_mismatch() {
    common::init_logger();
    let geometry = tool();
    let full = coal_log(&geometry);
    let mut partial = RawChannelSet::new(full.depths().to_vec(), full.speed().to_vec());
    for (id, values) in full.channels() {
        if id != ButtonId::new(7, 23) {
            partial.insert(id, values.to_vec());
        }
    }
    let err = BoreholeImager::new(geometry, PipelineParams::default())
        .run(&partial, None, None, None)
        .unwrap_err();
    assert_eq!(
        err,
        ImagerError::GeometryMismatch {
            pad: 7,
            expected: 24,
            actual: 23
        }
    );
}

#[test]
fn empty_zone_has_no_cutoff_samples() {
    common::init_logger();
    let geometry = tool();
    let raw = coal_log(&geometry);
    let err = BoreholeImager::new(geometry, PipelineParams::default())
        .run(&raw, Some(DepthRange::new(900.0, 910.0)), None, None)
        .unwrap_err();
    assert_eq!(err, ImagerError::EmptyDistribution);
}
