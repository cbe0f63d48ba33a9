//! Command implementations plus the helpers they share.

pub mod config;
pub mod create;
pub mod filters;
pub mod interactive;

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use postcraft_core::{DragAxis, PanOffset, Point, PointerDevice, PostComposer, PostRecord, Size};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Supported output formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON object
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Print a created post to stdout, or write it to `output`.
///
/// JSON overwrites the file; JSONL appends a line so repeated runs build up
/// a log of posts.
pub fn emit_record(
    record: &PostRecord,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(record)?,
        OutputFormat::Jsonl => serde_json::to_string(record)?,
    };

    match output {
        None => println!("{text}"),
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .append(format == OutputFormat::Jsonl)
                .truncate(format == OutputFormat::Json)
                .open(path)?;
            writeln!(file, "{text}")?;
            tracing::info!("Post record written to {}", path.display());
        }
    }
    Ok(())
}

/// Pan the preview by `amount` pixels along its free axis with one simulated
/// drag from the viewport center. Negative moves the image left/up.
pub fn pan_by(composer: &mut PostComposer, amount: f64, viewport: Size) -> PanOffset {
    let start = Point::new(viewport.width / 2.0, viewport.height / 2.0);
    let end = match composer.drag_axis() {
        DragAxis::Horizontal => Point::new(start.x + amount, start.y),
        DragAxis::Vertical => Point::new(start.x, start.y + amount),
        DragAxis::None => start,
    };
    if composer.pointer_down(start, PointerDevice::Mouse) {
        composer.pointer_move(end);
        composer.pointer_up();
    }
    composer.pan_offset()
}

/// Spinner shown on stderr while a post is being shared.
pub fn share_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Sharing post...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
