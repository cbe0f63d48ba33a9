//! postcraft CLI - compose image posts: crop to a square, filter, caption, share.
//!
//! # Usage
//!
//! ```bash
//! # Guided mode (on a terminal)
//! postcraft
//!
//! # Share a post in one go
//! postcraft create beach.jpg --pan -120 --filter clarendon --caption "golden hour"
//!
//! # List filters
//! postcraft filters
//!
//! # View configuration
//! postcraft config show
//! ```

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

/// postcraft - crop, filter, caption and share image posts.
#[derive(Parser, Debug)]
#[command(name = "postcraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Crop, filter, caption and share a single image or video
    Create(cli::create::CreateArgs),

    /// List the available filters
    Filters(cli::filters::FiltersArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match postcraft_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `postcraft config path`."
            );
            postcraft_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("postcraft v{}", postcraft_core::VERSION);

    match cli.command {
        Some(Commands::Create(args)) => cli::create::execute(args, config).await,
        Some(Commands::Filters(args)) => cli::filters::execute(args),
        Some(Commands::Config(args)) => cli::config::execute(args).await,
        None if console::user_attended() => cli::interactive::run(&config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
