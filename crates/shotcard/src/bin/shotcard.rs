//! `shotcard` - score a photographed target sheet.

use std::path::PathBuf;

use clap::Parser;
use log::info;
use shotcard::{io, score_canonical_sheet, ScoreParams, SheetScorer, StaticMaskSegmenter};

#[derive(Parser)]
#[command(name = "shotcard")]
#[command(about = "Score bullet impacts on a photographed five-ring target sheet")]
#[command(version)]
struct Cli {
    /// Photo of the sheet (or the rectified sheet with --rectified).
    #[arg(long)]
    image: PathBuf,

    /// Sheet segmentation mask for the photo, any size.
    #[arg(long, required_unless_present = "rectified")]
    mask: Option<PathBuf>,

    /// The image is already a rectified, square sheet.
    #[arg(long)]
    rectified: bool,

    /// JSON parameters; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Save the rectified sheet as an image.
    #[arg(long)]
    sheet_out: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    shotcard_core::init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    shotcard_core::init_with_level(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    })?;

    let params = match &cli.config {
        Some(path) => io::load_params(path)?,
        None => ScoreParams::default(),
    };

    let photo = io::load_rgb(&cli.image)?;
    info!(
        "loaded {} ({}×{})",
        cli.image.display(),
        photo.width(),
        photo.height()
    );

    let result = match (&cli.mask, cli.rectified) {
        (_, true) => score_canonical_sheet(photo, &params)?,
        (Some(mask_path), false) => {
            let segmenter = StaticMaskSegmenter::new(io::load_mask(mask_path)?);
            SheetScorer::new(segmenter, params).score(&photo)?
        }
        (None, false) => return Err("--mask is required unless --rectified is set".into()),
    };

    if let Some(path) = &cli.sheet_out {
        result.sheet.save(path)?;
        info!("rectified sheet written to {}", path.display());
    }

    let report = result.report();
    match &cli.output {
        Some(path) => {
            io::write_report(path, &report)?;
            info!("report written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
