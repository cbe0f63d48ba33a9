//! The `postcraft filters` command: list the filter catalog.

use clap::Args;
use postcraft_core::Filter;
use serde::Serialize;

/// Arguments for the `filters` command.
#[derive(Args, Debug)]
pub struct FiltersArgs {
    /// Print the catalog as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct FilterEntry {
    name: &'static str,
    css: String,
}

fn catalog() -> Vec<FilterEntry> {
    Filter::ALL
        .iter()
        .map(|f| FilterEntry {
            name: f.name(),
            css: f.css(),
        })
        .collect()
}

/// Execute the filters command.
pub fn execute(args: FiltersArgs) -> anyhow::Result<()> {
    let entries = catalog();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    for entry in &entries {
        println!("{:<width$}  {}", entry.name, entry.css);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_default() {
        let entries = catalog();
        assert_eq!(entries.len(), 12);
        assert_eq!(entries[0].name, "Original");
        assert_eq!(entries[0].css, "none");
        assert_eq!(entries[11].name, "Slumber");
    }
}
