use borehole_imager::prelude::*;

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> borehole_imager::Result<()> {
    // Demo stub: synthesizes a 6 m run of an 8-pad tool and processes it.
    let geometry = ToolGeometry::evenly_spaced(8, 24, 30.0);
    let raw = synthetic_log(&geometry, 400.0, 3000, 0.002);

    let imager = BoreholeImager::new(geometry, PipelineParams::default());
    let res = imager.run(&raw, None, None, None)?;

    let summary = &res.image_summary;
    println!(
        "image: {} rows x {} bins, coverage {:.1}%",
        summary.rows,
        summary.azimuth_bins,
        100.0 * summary.coverage_fraction
    );
    println!(
        "cutoff: {:.2} ({:?})",
        res.cutoff.cutoff, res.cutoff.confidence
    );
    for seam in &res.seams {
        println!(
            "coal: {:.3}-{:.3} m thickness={:.3} m",
            seam.top, seam.base, seam.thickness
        );
    }
    println!(
        "features: fractures={} beddings={} faults={}",
        res.features.fractures.len(),
        res.features.beddings.len(),
        res.features.faults.len()
    );
    println!("latency_ms={:.3}", res.timings.total_ms);
    Ok(())
}

/// Layered background with a coal band and a conductive vertical streak.
fn synthetic_log(geometry: &ToolGeometry, top: f64, rows: usize, step: f64) -> RawChannelSet {
    let depths: Vec<f64> = (0..rows).map(|i| top + i as f64 * step).collect();
    let mut raw = RawChannelSet::new(depths.clone(), vec![1.0; rows]);
    for (p, pad) in geometry.pads.iter().enumerate() {
        for b in 0..pad.buttons {
            let azimuth = geometry.button_azimuth(p, b).unwrap_or(0.0);
            let trace = depths
                .iter()
                .map(|&d| {
                    let mut v = if d < top + 3.0 { 150.0 } else { 260.0 };
                    v += 10.0 * ((d - top) * 40.0).sin() as f32;
                    if (top + 0.8..top + 1.3).contains(&d) {
                        v = 15.0;
                    }
                    if (top + 4.0..top + 4.6).contains(&d) && (85.0..=105.0).contains(&azimuth) {
                        v *= 4.0;
                    }
                    v
                })
                .collect();
            raw.insert(ButtonId::new(p, b), trace);
        }
    }
    raw
}
