use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};

use dicom_mosaic::{
    ClampPolicy, SeriesLoader, Settings, SortBy, ViewState, logging::setup_logging, render,
};

/// Render a file of a DICOM folder as a grayscale image
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Folder to load; defaults to the last opened folder
    folder: Option<PathBuf>,

    /// Index of the file in acquisition order
    #[arg(long, default_value_t = 0)]
    file: usize,

    /// Frame to show when demosaiced
    #[arg(long, default_value_t = 0)]
    frame: usize,

    /// Axis frames are taken along when demosaiced
    #[arg(long, default_value_t = 0)]
    axis: usize,

    /// Show a single frame instead of the mosaic
    #[arg(long)]
    demosaic: bool,

    /// Counter-clockwise quarter turns of a demosaiced frame
    #[arg(long, default_value_t = 0)]
    rotate: u8,

    /// Lower window bound; defaults to the smallest pixel value of the series
    #[arg(long)]
    vmin: Option<f32>,

    /// Upper window bound; defaults to the largest pixel value of the series
    #[arg(long)]
    vmax: Option<f32>,

    /// A bound set past the other one drags it along instead of stopping
    #[arg(long)]
    push_bounds: bool,

    #[arg(long, value_enum, default_value_t = SortBy::InstanceNumber)]
    sort_by: SortBy,

    #[arg(long, short, default_value = "result.png")]
    output: PathBuf,

    /// Print the header of the selected file
    #[arg(long)]
    dump: bool,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _logger = setup_logging(&args.log_level).context("Logger initialization failed")?;

    let settings_path = Settings::default_location();
    let mut settings = Settings::load(&settings_path)
        .with_context(|| format!("Could not read {}", settings_path.display()))?;
    let folder = args.folder.clone().unwrap_or_else(|| settings.dicom_path.clone());

    info!("Loading {}, please be patient", folder.display());
    let series = SeriesLoader::load_in_background(folder.clone(), args.sort_by)
        .await
        .with_context(|| format!("No dicom images found in {}", folder.display()))?;
    info!(
        "{} file{} loaded from {}.",
        series.len(),
        if series.len() == 1 { "" } else { "s" },
        series.folder().display()
    );

    if settings.remember_folder(&folder) {
        if let Err(err) = settings.save(&settings_path) {
            warn!("Could not save settings to {}: {err}", settings_path.display());
        }
    }

    let mut state = ViewState::for_series(&series);
    state.select_file(&series, args.file);
    if args.demosaic && !state.toggle_mosaic(&series) {
        warn!("Demosaicing is only available for Enhanced MR images");
    }
    if args.axis != 0 && !state.select_axis(&series, args.axis) {
        warn!("Axis {} is not available, keeping axis {}", args.axis, state.axis);
    }
    if args.frame != 0 && !state.select_frame(&series, args.frame) {
        warn!(
            "Frame {} is out of range (0..{}), keeping frame {}",
            args.frame,
            state.frame_choices(&series),
            state.frame_no
        );
    }
    if !state.is_mosaic() {
        for _ in 0..args.rotate % 4 {
            state.rotate();
        }
    }
    if args.push_bounds {
        state.window = state.window.with_policy(ClampPolicy::PushOther);
    }
    if let Some(vmin) = args.vmin {
        state.set_vmin(vmin);
    }
    if let Some(vmax) = args.vmax {
        state.set_vmax(vmax);
    }

    if args.dump {
        if let Some(header) = series.dump_header(state.file_no) {
            println!("{header}");
        }
    }

    let rendered = render(&series, &state)?;
    rendered
        .image
        .save(&args.output)
        .with_context(|| format!("Could not write {}", args.output.display()))?;
    let instance = series
        .get(state.file_no)
        .and_then(|image| image.instance_number())
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    info!(
        "Rendered {} (instance {}, window {}..{}) to {}",
        rendered.title,
        instance,
        state.window.vmin(),
        state.window.vmax(),
        args.output.display()
    );

    Ok(())
}
