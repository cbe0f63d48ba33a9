//! The `postcraft create` command: compose and share a post from flags.
//!
//! Drives the same composer a UI would, headlessly: select → pan → Next →
//! filter → Next → caption → Share.

use anyhow::Context;
use clap::Args;
use postcraft_core::pipeline::MAX_CAPTION_CHARS;
use postcraft_core::{
    Config, Filter, IncomingFile, MediaSource, Postcraft, RecordingSurface, Size,
};
use std::path::PathBuf;

use super::{emit_record, pan_by, share_spinner, OutputFormat};

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Image or video file to post
    #[arg(required = true)]
    pub input: PathBuf,

    /// Pan along the free axis in viewport pixels (negative moves the image left/up)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub pan: f64,

    /// Filter to apply (see `postcraft filters`)
    #[arg(short = 'F', long, default_value = "original")]
    pub filter: Filter,

    /// Caption text (truncated at 2200 characters)
    #[arg(short, long, default_value = "")]
    pub caption: String,

    /// Author id (overrides profile.author_id)
    #[arg(long, env = "POSTCRAFT_AUTHOR")]
    pub author: Option<String>,

    /// Crop viewport as WIDTHxHEIGHT (overrides [viewport])
    #[arg(long, value_parser = parse_viewport)]
    pub viewport: Option<Size>,

    /// Output file for the post record (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Parse `640x640` (also `640X640`, `640*640`).
pub fn parse_viewport(raw: &str) -> Result<Size, String> {
    let (w, h) = raw
        .split_once(|c| matches!(c, 'x' | 'X' | '*'))
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{raw}'"))?;
    let width: f64 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let height: f64 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
        return Err(format!("viewport must be positive, got {width}x{height}"));
    }
    Ok(Size::new(width, height))
}

/// Execute the create command.
pub async fn execute(args: CreateArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(author) = args.author {
        config.profile.author_id = author;
    }
    if let Some(viewport) = args.viewport {
        config.viewport.width = viewport.width;
        config.viewport.height = viewport.height;
    }

    // Overrides bypassed the checks done at load time
    config.validate()?;
    let postcraft = Postcraft::new(config)?;
    let viewport = postcraft.viewport();

    let file = IncomingFile::from_path(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut composer = postcraft.composer(RecordingSurface::new());
    composer.select_file(file, MediaSource::Picker)?;

    if let Some(geometry) = composer.layout_in(viewport) {
        tracing::debug!(
            "Preview {:.1}x{:.1} in {}x{} viewport",
            geometry.image.width,
            geometry.image.height,
            viewport.width,
            viewport.height
        );
    }
    if args.pan != 0.0 {
        let offset = pan_by(&mut composer, args.pan, viewport);
        tracing::info!("Pan {} -> {}", args.pan, offset.css_transform());
    }
    if let Some(crop) = composer.crop_region() {
        tracing::debug!(
            "Crop region: {:.1},{:.1} {:.1}x{:.1}",
            crop.x,
            crop.y,
            crop.width,
            crop.height
        );
    }

    composer.next()?;
    composer.select_filter(args.filter)?;
    composer.next()?;

    let typed = composer.type_caption(&args.caption)?;
    if typed < args.caption.chars().count() {
        tracing::warn!("Caption truncated to {MAX_CAPTION_CHARS} characters");
    }

    let spinner = share_spinner();
    let result = composer.share(postcraft.stores()).await;
    spinner.finish_and_clear();
    let record = result?;

    emit_record(&record, args.output.as_deref(), args.format)
}
