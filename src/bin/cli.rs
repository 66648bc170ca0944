//! CLI application for filtering an image and drawing stickers on it.
//!
//! Usage:
//!   face-filter <image> --filter sepia -o out.png              # Filter only
//!   face-filter <image> --faces faces.json --accessory hat     # Stickers
//!   face-filter <image> --config settings.json --json          # JSON report
//!   face-filter <image> --faces faces.json --landmarks -o dbg.png  # Mark landmarks

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use face_filter::overlay::{draw_landmarks, paired_asset_path};
use face_filter::{
    AccessoryKind, AccessorySprite, Face, FilterKind, FrameProcessor, FrameStatus, PixelFormat,
    PlanarFrame, Settings,
};
use image::imageops;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "face-filter")]
#[command(author, version, about = "NV12 color filters and face stickers", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Faces as JSON: [{"bbox": {...}, "points": [{"x": .., "y": ..}, ...]}]
    #[arg(long)]
    faces: Option<PathBuf>,

    /// Filter to apply (overrides the config file)
    #[arg(short, long)]
    filter: Option<FilterKind>,

    /// Accessory to draw on every face; repeatable (overrides the config file)
    #[arg(short, long = "accessory")]
    accessories: Vec<AccessoryKind>,

    /// Directory holding the sticker sprites
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output image file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mark the landmarks and face boxes on the output image
    #[arg(long)]
    landmarks: bool,

    /// Print the run report as JSON
    #[arg(short, long)]
    json: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Run report for JSON serialization
#[derive(Serialize)]
struct Report {
    image: String,
    width: u32,
    height: u32,
    filter: FilterKind,
    status: String,
    faces: usize,
    accessories: Vec<AccessoryKind>,
    pixels_drawn: usize,
    output: Option<String>,
    elapsed_us: u64,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {:?}", path))?,
        None => Settings::default(),
    };
    if let Some(filter) = args.filter {
        settings.filter = filter;
    }
    if !args.accessories.is_empty() {
        settings.accessories = args.accessories.clone();
    }

    let faces = match &args.faces {
        Some(path) => load_faces(path)?,
        None => Vec::new(),
    };
    if !settings.accessories.is_empty() && faces.is_empty() {
        info!("no faces given, accessories will not be drawn");
    }

    let mut processor = FrameProcessor::new(settings.clone());
    for &kind in &settings.accessories {
        let sprite = load_sprite(&args.assets, kind)?;
        processor.set_sprite(kind, sprite);
    }

    debug!("Loading image {:?}...", args.image);
    let rgb = image::open(&args.image)
        .with_context(|| format!("Failed to open image {:?}", args.image))?
        .to_rgb8();

    // NV12 needs even dimensions; drop a trailing row or column if necessary.
    let (width, height) = (rgb.width() & !1, rgb.height() & !1);
    if width == 0 || height == 0 {
        bail!("Image {:?} is too small", args.image);
    }
    let rgb = if (width, height) == rgb.dimensions() {
        rgb
    } else {
        debug!(width, height, "cropping to even dimensions");
        imageops::crop_imm(&rgb, 0, 0, width, height).to_image()
    };

    let start = Instant::now();
    let mut frame = PlanarFrame::from_rgb(&rgb)?;
    let mut rendered = processor.render(PixelFormat::Nv12, &mut frame, &faces);
    if args.landmarks {
        for (i, face) in faces.iter().enumerate() {
            for (index, p) in face.landmarks.points().iter().enumerate() {
                debug!(face = i + 1, index, x = p.x, y = p.y, "landmark");
            }
            draw_landmarks(face, &mut rendered.image);
        }
    }
    let elapsed_us = start.elapsed().as_micros() as u64;

    if let Some(path) = &args.output {
        rendered
            .image
            .save(path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Output written to {:?}", path);
    }

    let report = Report {
        image: args.image.display().to_string(),
        width,
        height,
        filter: settings.filter,
        status: describe_status(rendered.status),
        faces: faces.len(),
        accessories: settings.accessories.clone(),
        pixels_drawn: rendered.pixels_drawn,
        output: args.output.as_ref().map(|p| p.display().to_string()),
        elapsed_us,
    };

    let report_str = if args.json {
        serde_json::to_string_pretty(&report)?
    } else {
        format_human_readable(&report)
    };
    println!("{}", report_str);

    Ok(())
}

fn load_faces(path: &Path) -> Result<Vec<Face>> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read faces {:?}", path))?;
    let faces = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse faces {:?}", path))?;
    Ok(faces)
}

fn load_sprite(assets: &Path, kind: AccessoryKind) -> Result<AccessorySprite> {
    let path = assets.join(kind.default_asset());
    debug!("Loading {} sprite from {:?}...", kind, path);
    let primary = image::open(&path)
        .with_context(|| format!("Failed to load {} sprite {:?}", kind, path))?
        .to_rgba8();
    let mut sprite = AccessorySprite::new(primary);

    if kind == AccessoryKind::Ear {
        if let Some(pair) = paired_asset_path(&path).filter(|p| p.exists()) {
            let mirrored = image::open(&pair)
                .with_context(|| format!("Failed to load {} sprite {:?}", kind, pair))?
                .to_rgba8();
            sprite = sprite.with_mirrored(mirrored);
        }
    }

    Ok(sprite)
}

fn describe_status(status: FrameStatus) -> String {
    match status {
        FrameStatus::Filtered(kind) => format!("filtered ({})", kind),
        FrameStatus::Passthrough => "passthrough".to_string(),
        FrameStatus::UnsupportedFormat(format) => format!("unsupported format ({})", format),
    }
}

fn format_human_readable(report: &Report) -> String {
    let mut s = String::new();

    s.push_str(&format!("Image: {} ({}x{})\n", report.image, report.width, report.height));
    s.push_str(&format!("Filter: {} [{}]\n", report.filter, report.status));
    s.push_str(&format!("Faces: {}\n", report.faces));

    if report.accessories.is_empty() {
        s.push_str("Accessories: none\n");
    } else {
        let names: Vec<&str> = report.accessories.iter().map(|a| a.name()).collect();
        s.push_str(&format!(
            "Accessories: {} ({} pixels drawn)\n",
            names.join(", "),
            report.pixels_drawn
        ));
    }

    if let Some(ref output) = report.output {
        s.push_str(&format!("Output: {}\n", output));
    }
    s.push_str(&format!("Time: {:.2} ms", report.elapsed_us as f64 / 1000.0));

    s
}
