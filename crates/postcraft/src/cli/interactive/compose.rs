//! Guided post composition.
//!
//! One prompt per composer stage: pick a file → pan the crop → choose a
//! filter → write the caption → share. Esc behaves like the modal's Escape
//! key, so leaving with media selected asks before discarding it.

use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use postcraft_core::pipeline::{DiscardIntent, EMOJI_PALETTE, MAX_CAPTION_CHARS};
use postcraft_core::{
    Collaborators, Config, Filter, IncomingFile, MediaSource, PostComposer, PostRecord,
    Postcraft, RecordingSurface, Size, Stage,
};
use std::path::PathBuf;

use super::handle_interrupt;
use super::theme::postcraft_theme;
use crate::cli::{pan_by, share_spinner};

/// What the loop does after a stage prompt.
#[derive(Debug)]
enum Flow {
    Continue,
    /// Esc on a prompt
    Escape,
    /// Ctrl+C: leave without the discard prompt
    Interrupted,
    Shared(PostRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CropAction {
    Pan,
    Next,
    Back,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FinalAction {
    WriteCaption,
    AddEmoji,
    Share,
    Back,
    Close,
}

const FINAL_ACTIONS: &[(FinalAction, &str)] = &[
    (FinalAction::WriteCaption, "Write caption"),
    (FinalAction::AddEmoji, "Add emoji"),
    (FinalAction::Share, "Share"),
    (FinalAction::Back, "Back"),
    (FinalAction::Close, "Close"),
];

/// Crop actions on offer. Pan is only useful when the image overflows.
fn crop_actions(can_pan: bool) -> Vec<(CropAction, &'static str)> {
    let mut actions = Vec::with_capacity(4);
    if can_pan {
        actions.push((CropAction::Pan, "Pan the crop"));
    }
    actions.push((CropAction::Next, "Next"));
    actions.push((CropAction::Back, "Back"));
    actions.push((CropAction::Close, "Close"));
    actions
}

/// Filter menu lines, the active one marked.
fn filter_items(active: Filter) -> Vec<String> {
    let mut items = vec!["Next".to_string()];
    items.extend(Filter::ALL.iter().map(|f| {
        let marker = if *f == active { "●" } else { " " };
        format!("{marker} {:<10} {}", f.name(), f.css())
    }));
    items.push("Back".to_string());
    items.push("Close".to_string());
    items
}

fn warn(message: impl std::fmt::Display) {
    eprintln!("  {}", Style::new().for_stderr().yellow().apply_to(message));
}

fn fail(message: impl std::fmt::Display) {
    eprintln!(
        "  {} {}",
        Style::new().for_stderr().red().apply_to("✗"),
        message
    );
}

/// Walk the user through one post.
pub async fn guided_compose(config: &Config) -> anyhow::Result<()> {
    let theme = postcraft_theme();
    let postcraft = match Postcraft::new(config.clone()) {
        Ok(p) => p,
        Err(e) => {
            fail(format!("Storage is not usable: {e}"));
            return Ok(());
        }
    };
    let viewport = postcraft.viewport();
    let mut composer = postcraft.composer(RecordingSurface::new());

    while composer.is_open() {
        if let Some(intent) = composer.pending_discard() {
            resolve_discard(&mut composer, &theme, intent)?;
            continue;
        }

        let flow = match composer.stage() {
            Stage::Upload => upload_step(&mut composer, &theme, viewport).await?,
            Stage::Crop => crop_step(&mut composer, &theme, viewport)?,
            Stage::Edit => edit_step(&mut composer, &theme)?,
            Stage::Final => final_step(&mut composer, &theme, postcraft.stores()).await?,
            Stage::Submitting => Flow::Continue,
        };

        match flow {
            Flow::Continue => {}
            Flow::Escape => {
                composer.escape();
            }
            Flow::Interrupted => break,
            Flow::Shared(record) => {
                let done = Style::new().for_stderr().green();
                eprintln!("  {} Shared {}", done.apply_to("✓"), record.image_url);
                println!("{}", serde_json::to_string_pretty(&record)?);
                break;
            }
        }
    }

    Ok(())
}

async fn upload_step(
    composer: &mut PostComposer,
    theme: &ColorfulTheme,
    viewport: Size,
) -> anyhow::Result<Flow> {
    let Some(raw) = handle_interrupt(
        Input::<String>::with_theme(theme)
            .with_prompt("Image or video file (empty to close)")
            .allow_empty(true)
            .interact_text(),
    )?
    else {
        return Ok(Flow::Interrupted);
    };

    let raw = raw.trim();
    if raw.is_empty() {
        composer.request_close();
        return Ok(Flow::Continue);
    }

    let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
    let file = match IncomingFile::from_path(&path).await {
        Ok(file) => file,
        Err(e) => {
            warn(format!("Cannot read {}: {e}", path.display()));
            return Ok(Flow::Continue);
        }
    };

    match composer.select_file(file, MediaSource::Picker) {
        Ok(()) => {
            composer.layout_in(viewport);
        }
        Err(e) => fail(e),
    }
    Ok(Flow::Continue)
}

fn crop_step(
    composer: &mut PostComposer,
    theme: &ColorfulTheme,
    viewport: Size,
) -> anyhow::Result<Flow> {
    let dim = Style::new().for_stderr().dim();
    if let Some(selection) = composer.selection() {
        let size = selection
            .natural_size()
            .map(|s| format!("{}x{}", s.width, s.height))
            .unwrap_or_else(|| selection.mime.clone());
        eprintln!("  {}", dim.apply_to(format!("{} ({size})", selection.file_name)));
    }
    if let Some(crop) = composer.crop_region() {
        eprintln!(
            "  {}",
            dim.apply_to(format!(
                "Crop {:.0},{:.0} {:.0}x{:.0}",
                crop.x, crop.y, crop.width, crop.height
            ))
        );
    }

    let can_pan = composer.drag_axis() != postcraft_core::DragAxis::None;
    let actions = crop_actions(can_pan);
    let labels: Vec<&str> = actions.iter().map(|(_, label)| *label).collect();

    let Some(choice) = Select::with_theme(theme)
        .with_prompt(composer.header().title)
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(Flow::Escape);
    };

    match actions[choice].0 {
        CropAction::Pan => {
            let Some(amount) = handle_interrupt(
                Input::<f64>::with_theme(theme)
                    .with_prompt("Pan by pixels (negative moves left/up)")
                    .default(0.0)
                    .interact_text(),
            )?
            else {
                return Ok(Flow::Interrupted);
            };
            let offset = pan_by(composer, amount, viewport);
            eprintln!("  {}", dim.apply_to(offset.css_transform()));
        }
        CropAction::Next => {
            composer.next()?;
        }
        CropAction::Back => {
            composer.back();
        }
        CropAction::Close => {
            composer.request_close();
        }
    }
    Ok(Flow::Continue)
}

fn edit_step(composer: &mut PostComposer, theme: &ColorfulTheme) -> anyhow::Result<Flow> {
    let items = filter_items(composer.filter());
    let active = Filter::ALL
        .iter()
        .position(|f| *f == composer.filter())
        .unwrap_or(0);

    let Some(choice) = Select::with_theme(theme)
        .with_prompt(composer.header().title)
        .items(&items)
        .default(active + 1)
        .interact_opt()?
    else {
        return Ok(Flow::Escape);
    };

    let filters = Filter::ALL.len();
    match choice {
        0 => {
            composer.next()?;
        }
        i if i <= filters => composer.select_filter(Filter::ALL[i - 1])?,
        i if i == filters + 1 => {
            composer.back();
        }
        _ => {
            composer.request_close();
        }
    }
    Ok(Flow::Continue)
}

async fn final_step(
    composer: &mut PostComposer,
    theme: &ColorfulTheme,
    stores: &Collaborators,
) -> anyhow::Result<Flow> {
    let dim = Style::new().for_stderr().dim();
    let caption = composer.caption();
    if !caption.is_empty() {
        eprintln!("  \"{}\"", caption.text());
    }
    eprintln!(
        "  {}",
        dim.apply_to(format!(
            "{}/{MAX_CAPTION_CHARS} · filter {}",
            caption.len(),
            composer.filter()
        ))
    );

    let labels: Vec<&str> = FINAL_ACTIONS.iter().map(|(_, label)| *label).collect();
    let Some(choice) = Select::with_theme(theme)
        .with_prompt(composer.header().title)
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(Flow::Escape);
    };

    match FINAL_ACTIONS[choice].0 {
        FinalAction::WriteCaption => {
            let Some(text) = handle_interrupt(
                Input::<String>::with_theme(theme)
                    .with_prompt("Caption")
                    .with_initial_text(composer.caption().text())
                    .allow_empty(true)
                    .interact_text(),
            )?
            else {
                return Ok(Flow::Interrupted);
            };
            composer.select_caption(0, composer.caption().len())?;
            if text.is_empty() {
                composer.delete_caption_backward()?;
            } else if composer.type_caption(&text)? < text.chars().count() {
                warn(format!("Caption cut at {MAX_CAPTION_CHARS} characters"));
            }
        }
        FinalAction::AddEmoji => {
            composer.toggle_emoji_picker()?;
            let picked = Select::with_theme(theme)
                .with_prompt("Emoji")
                .items(EMOJI_PALETTE)
                .default(0)
                .interact_opt()?;
            match picked {
                Some(i) => {
                    let end = composer.caption().len();
                    composer.select_caption(end, end)?;
                    if !composer.insert_emoji(EMOJI_PALETTE[i])? {
                        warn("Caption is full");
                    }
                }
                None => composer.click_outside_emoji_picker(),
            }
        }
        FinalAction::Share => {
            let spinner = share_spinner();
            let result = composer.share(stores).await;
            spinner.finish_and_clear();
            match result {
                Ok(record) => return Ok(Flow::Shared(record)),
                Err(e) => fail(composer.error_message().map_or_else(|| e.to_string(), str::to_string)),
            }
        }
        FinalAction::Back => {
            composer.back();
        }
        FinalAction::Close => {
            composer.request_close();
        }
    }
    Ok(Flow::Continue)
}

fn resolve_discard(
    composer: &mut PostComposer,
    theme: &ColorfulTheme,
    intent: DiscardIntent,
) -> anyhow::Result<()> {
    let prompt = match intent {
        DiscardIntent::Close => "Discard this post and close?",
        DiscardIntent::Back => "Discard this photo and pick another?",
    };
    let confirmed = Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(false)
        .interact_opt()?;

    if confirmed == Some(true) {
        composer.confirm_discard();
    } else {
        composer.cancel_discard();
    }
    Ok(())
}
