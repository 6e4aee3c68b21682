use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use watermark::style::{self, Anchor, Drawer};
use watermark::{Color, DefaultLoader, Font, Options, OutputFormat, Surface};

/// Watermark - composite images and text onto a base image
#[derive(Parser, Debug)]
#[command(name = "watermark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base image followed by overlay images (paths, file://, http(s):// or data: URLs)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write the encoded image here instead of printing a data URL
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Where to place the overlay
    #[arg(short, long, default_value = "lower-right")]
    position: Anchor,

    /// Overlay opacity from 0 to 1
    #[arg(short, long)]
    alpha: Option<f32>,

    /// Draw this text instead of an image overlay
    #[arg(long, requires = "font")]
    text: Option<String>,

    /// TrueType/OpenType font used for --text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font size in pixels
    #[arg(long, default_value_t = 24.0)]
    font_size: f32,

    /// Text color (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long, default_value = "#FFFFFF")]
    fill: Color,

    /// Manual text baseline, replacing the position's default
    #[arg(long)]
    baseline: Option<f32>,

    /// Output type (image/png or image/jpeg)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Compression quality from 0 to 1
    #[arg(short, long)]
    quality: Option<f32>,

    /// Timeout in seconds for HTTP(S) inputs
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a YAML options file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn build_options(args: &Args) -> anyhow::Result<Options> {
    let mut options = match &args.config {
        Some(path) => Options::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Options::default(),
    };

    if let Some(format) = args.format {
        options = options.with_type(format);
    }
    if let Some(quality) = args.quality {
        options = options.with_encoder_options(quality);
    }
    if let Some(secs) = args.timeout {
        let loader = DefaultLoader::new().with_timeout(Duration::from_secs(secs));
        options = options.with_loader(Arc::new(loader));
    }
    options.validate()?;

    Ok(options)
}

/// The overlay chosen on the command line.
enum Overlay {
    Image(style::image::ImageDrawer),
    Text(style::text::TextDrawer),
}

impl Drawer for Overlay {
    fn draw(&self, target: &mut Surface, sources: &[&Surface]) {
        match self {
            Overlay::Image(drawer) => drawer.draw(target, sources),
            Overlay::Text(drawer) => drawer.draw(target, sources),
        }
    }
}

fn build_overlay(args: &Args) -> anyhow::Result<Overlay> {
    let Some(text) = &args.text else {
        if args.inputs.len() < 2 {
            bail!("an overlay image or --text is required");
        }
        return Ok(Overlay::Image(style::image::ImageDrawer::new(
            args.position,
            args.alpha,
        )));
    };

    let Some(font_path) = &args.font else {
        bail!("--text requires --font");
    };
    let font = Font::from_file(font_path, args.font_size)?;

    Ok(Overlay::Text(style::text::TextDrawer::new(
        args.position,
        text.clone(),
        font,
        args.fill,
        args.alpha,
        args.baseline,
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    watermark::logging::init_subscriber(args.json_logs)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let options = build_options(&args)?;
    let overlay = build_overlay(&args)?;

    tracing::info!(
        inputs = args.inputs.len(),
        position = %args.position,
        format = %options.output_type,
        "Watermarking"
    );

    let pipeline = watermark::watermark(args.inputs.iter().map(String::as_str), options);

    match &args.out {
        Some(path) => {
            let blob = pipeline.blob(overlay).await?;
            let bytes = blob.len();
            tokio::fs::write(path, blob.into_bytes())
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(out = %path.display(), bytes, "Wrote image");
        }
        None => {
            let url = pipeline.data_url(overlay).await?;
            println!("{}", url);
        }
    }

    watermark::destroy();
    Ok(())
}
