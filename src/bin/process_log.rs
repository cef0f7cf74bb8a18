use borehole_imager::config::{load_config, RuntimeConfig};
use borehole_imager::image::io::{read_json_file, save_intensity_png, write_json_file};
use borehole_imager::tool::{DensityLog, RawChannelSet};
use borehole_imager::{BoreholeImager, PipelineResult};
use std::env;
use std::path::Path;

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "process_log".to_string());
    let config_path = args
        .next()
        .ok_or_else(|| format!("usage: {program} <config.json>"))?;
    let config_path = Path::new(&config_path);
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let config = load_config(config_path)
        .map_err(|e| e.to_string())?
        .resolve_paths(base);

    let raw: RawChannelSet = read_json_file(&config.input).map_err(|e| e.to_string())?;
    let density: Option<DensityLog> = match &config.density {
        Some(path) => Some(read_json_file(path).map_err(|e| e.to_string())?),
        None => None,
    };

    let imager = BoreholeImager::new(config.geometry.clone(), config.params.clone());
    let result = imager
        .run(
            &raw,
            config.zone,
            density.as_ref(),
            config.formations.as_ref(),
        )
        .map_err(|e| e.to_string())?;

    print_text_summary(&result);
    save_outputs(&config, &result).map_err(|e| e.to_string())?;
    Ok(())
}

fn print_text_summary(res: &PipelineResult) {
    let img = &res.image_summary;
    println!("Image");
    println!("  depth: {:.3} - {:.3} m (step {:.4} m)", img.top, img.base, img.depth_step);
    println!("  grid: {} rows x {} bins", img.rows, img.azimuth_bins);
    println!(
        "  coverage: {:.1}% ({} measured, {} interpolated, {} gap)",
        100.0 * img.coverage_fraction,
        img.measured_cells,
        img.interpolated_cells,
        img.gap_cells
    );

    println!("QC");
    println!("  valid samples: {:.1}%", res.qc.overall_valid_pct());
    for c in res.qc.low_availability() {
        println!(
            "  low availability: pad {} button {} ({:.1}%)",
            c.id.pad, c.id.button, c.valid_pct
        );
    }
    println!(
        "  outliers: {} of {} samples",
        res.qc.outliers.count, res.qc.outliers.samples
    );

    println!("Cutoff");
    println!(
        "  value: {:.2} ({:?}, {} samples)",
        res.cutoff.cutoff, res.cutoff.confidence, res.cutoff.samples
    );
    for est in &res.cutoff.estimators {
        match est.value {
            Some(v) => println!("  {:?}: {:.2} (weight {:.2})", est.kind, v, est.weight),
            None => println!("  {:?}: n/a", est.kind),
        }
    }

    println!("Coal");
    for seam in &res.seams {
        println!(
            "  {:8.3} - {:8.3} m  {:.3} m  mean {:.1}  {}",
            seam.top,
            seam.base,
            seam.thickness,
            seam.mean_conductivity,
            seam.formation.as_deref().unwrap_or("-")
        );
    }
    let summary = &res.coal_summary;
    println!(
        "  {} seams, {:.3} m net over {:.3} m gross (NTG {:.3})",
        summary.seam_count, summary.total_thickness, summary.gross_interval, summary.net_to_gross
    );
    for f in &summary.formations {
        println!(
            "  {}: {} seams, {:.3} m coal in {:.3} m (NTG {:.3})",
            f.name, f.seams, f.coal_thickness, f.gross_thickness, f.net_to_gross
        );
    }

    println!("Features");
    println!("  fractures: {}", res.features.fractures.len());
    println!("  bedding planes: {}", res.features.beddings.len());
    let associated = res
        .features
        .faults
        .iter()
        .filter(|f| f.fracture_association)
        .count();
    println!(
        "  faults: {} ({} with fracture association)",
        res.features.faults.len(),
        associated
    );

    println!("Timings");
    for stage in &res.timings.stages {
        println!("  {}: {:.3} ms", stage.label, stage.elapsed_ms);
    }
    println!("  total: {:.3} ms", res.timings.total_ms);
}

fn save_outputs(config: &RuntimeConfig, res: &PipelineResult) -> borehole_imager::Result<()> {
    let out = &config.output;
    if let Some(path) = &out.report_json {
        write_json_file(path, res)?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &out.seams_json {
        write_json_file(path, &res.seams)?;
        println!("Seams written to {}", path.display());
    }
    if let Some(path) = &out.features_json {
        write_json_file(path, &res.features.all())?;
        println!("Features written to {}", path.display());
    }
    if let Some(path) = &out.image_png {
        save_intensity_png(&res.image.values, &res.image.coverage, path)?;
        println!("Image preview written to {}", path.display());
    }
    Ok(())
}
