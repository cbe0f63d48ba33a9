//! Dialoguer theme and entry banner for interactive mode.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// `ColorfulTheme` with postcraft's magenta accents.
pub fn postcraft_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().magenta(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        active_item_prefix: style("▸".to_string()).for_stderr().magenta(),
        active_item_style: Style::new().for_stderr().magenta(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the version banner to stderr.
pub fn print_banner() {
    let version_line = format!("postcraft v{}", postcraft_core::VERSION);
    let tagline = "crop · filter · caption · share";

    let inner_width = tagline.chars().count() + 6;
    let border = Style::new().for_stderr().magenta();

    eprintln!();
    eprintln!("{}", border.apply_to(format!("  ┌{:─<inner_width$}┐", "")));
    eprintln!("{}", border.apply_to(format!("  │{version_line:^inner_width$}│")));
    eprintln!("{}", border.apply_to(format!("  │{tagline:^inner_width$}│")));
    eprintln!("{}", border.apply_to(format!("  └{:─<inner_width$}┘", "")));
    eprintln!();
}
