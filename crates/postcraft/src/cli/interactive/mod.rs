//! Interactive mode for a bare `postcraft` invocation on a TTY.
//!
//! A menu on top of the same composer the `create` command drives, with
//! Esc mapped to the composer's Escape handling.

pub mod compose;
pub mod theme;

use console::Style;
use dialoguer::Select;
use postcraft_core::Config;

/// Map a dialoguer result to `Ok(None)` on interrupt (Ctrl+C or a lost
/// terminal) so the current flow exits instead of surfacing an I/O error.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

const MENU_ITEMS: &[&str] = &["Create a post", "Browse filters", "Configure settings", "Exit"];

/// Entry point for interactive mode.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    theme::print_banner();

    let theme = theme::postcraft_theme();

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(MENU_ITEMS)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => compose::guided_compose(config).await?,
            Some(1) => browse_filters(),
            Some(2) => show_config(config)?,
            _ => break,
        }
    }

    Ok(())
}

fn browse_filters() {
    let label = Style::new().for_stderr().bold();
    let dim = Style::new().for_stderr().dim();

    eprintln!();
    for filter in postcraft_core::Filter::ALL {
        eprintln!(
            "    {:<12} {}",
            label.apply_to(filter.name()),
            dim.apply_to(filter.css())
        );
    }
    eprintln!();
}

/// Settings summary plus a way to dump the full TOML.
fn show_config(config: &Config) -> anyhow::Result<()> {
    let theme = theme::postcraft_theme();
    let dim = Style::new().for_stderr().dim();
    let accent = Style::new().for_stderr().magenta();
    let label = Style::new().for_stderr().bold();

    loop {
        eprintln!();
        eprintln!("  {}", accent.apply_to("Current configuration:"));
        eprintln!();

        let config_path = Config::default_path();
        let path_note = if config_path.exists() {
            "(exists)"
        } else {
            "(using defaults)"
        };

        eprintln!(
            "    {:<16} {} {}",
            label.apply_to("Config file:"),
            config_path.display(),
            dim.apply_to(path_note)
        );
        eprintln!(
            "    {:<16} {}",
            label.apply_to("Author:"),
            config.profile.author_id
        );
        eprintln!(
            "    {:<16} {}x{}",
            label.apply_to("Viewport:"),
            config.viewport.width,
            config.viewport.height
        );
        eprintln!(
            "    {:<16} {} (quality {})",
            label.apply_to("Export:"),
            config.export.format,
            config.export.quality
        );
        eprintln!(
            "    {:<16} {}",
            label.apply_to("Storage:"),
            storage_summary(config)
        );
        eprintln!(
            "    {:<16} {} MB, {}px",
            label.apply_to("Limits:"),
            config.limits.max_file_size_mb,
            config.limits.max_image_dimension
        );
        eprintln!(
            "    {:<16} {}",
            label.apply_to("Log level:"),
            config.logging.level
        );
        eprintln!();

        let items = &["View full config (TOML)", "Show config file path", "Back"];

        let selection = Select::with_theme(&theme)
            .with_prompt("Configuration")
            .items(items)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => match config.to_toml() {
                Ok(toml) => {
                    eprintln!();
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!("{toml}");
                    eprintln!("{}", dim.apply_to("─".repeat(50)));
                    eprintln!();
                }
                Err(e) => {
                    let err = Style::new().for_stderr().red();
                    eprintln!("  {} Failed to serialize config: {e}", err.apply_to("✗"));
                    eprintln!();
                }
            },
            Some(1) => {
                eprintln!();
                eprintln!("  {}", config_path.display());
                eprintln!();
            }
            _ => break,
        }
    }

    Ok(())
}

fn storage_summary(config: &Config) -> String {
    match config.storage.remote.as_ref() {
        Some(remote) if config.storage.backend == "remote" => {
            format!("remote ({})", remote.media_endpoint)
        }
        _ => format!(
            "{} ({}, {})",
            config.storage.backend,
            config.storage.media_dir().display(),
            config.storage.posts_file().display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_summary_local() {
        let mut config = Config::default();
        config.storage.media_dir = "/tmp/pc-media".to_string();
        let summary = storage_summary(&config);
        assert!(summary.starts_with("local"));
        assert!(summary.contains("/tmp/pc-media"));
    }
}
