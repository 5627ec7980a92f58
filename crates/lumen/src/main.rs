//! Lumen CLI - describe, edit, tag and search images with the Lumen vision API.
//!
//! Inference runs on the Lumen service; the CLI handles login, reads local
//! images, and keeps a per-directory embedding cache for search.
//!
//! # Usage
//!
//! ```bash
//! # Authorize this machine
//! lumen login
//!
//! # Single-image operations
//! lumen describe photo.jpg
//! lumen tag photo.jpg "animals" --choices cat,dog --single
//! lumen edit photo.jpg "make it night" -o night.png
//!
//! # Search the images in the current directory
//! lumen search "red car on a beach" -n 10
//! ```

use clap::{Parser, Subcommand};
use lumen_core::Session;

mod cli;
mod logging;

/// Lumen - image understanding from the command line.
#[derive(Parser, Debug)]
#[command(name = "lumen")]
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
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in with the device authorization flow
    Login,

    /// Remove the stored credential
    Logout,

    /// Show the logged-in account
    Whoami,

    /// Edit an image from a text prompt
    Edit(cli::image::EditArgs),

    /// Describe an image
    Describe(cli::image::DescribeArgs),

    /// Tag an image
    Tag(cli::image::TagArgs),

    /// Search images in the current directory by text
    Search(cli::search::SearchArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match lumen_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `lumen config path`."
            );
            lumen_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Lumen v{}", lumen_core::VERSION);

    let session = Session::new(config);

    match cli.command {
        Commands::Login => cli::auth::login(&session).await,
        Commands::Logout => cli::auth::logout(&session).await,
        Commands::Whoami => cli::auth::whoami(&session).await,
        Commands::Edit(args) => cli::image::edit(&session, args).await,
        Commands::Describe(args) => cli::image::describe(&session, args).await,
        Commands::Tag(args) => cli::image::tag(&session, args).await,
        Commands::Search(args) => cli::search::execute(&session, args).await,
        Commands::Config(args) => cli::config::execute(&session, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_tag_with_choices() {
        let cli = Cli::parse_from([
            "lumen", "-v", "tag", "a.jpg", "animals", "--choices", "cat,dog", "--single",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Tag(args) => {
                assert_eq!(args.choices, vec!["cat", "dog"]);
                assert!(args.single);
                assert!(args.mode.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_edit_output() {
        let cli = Cli::parse_from(["lumen", "edit", "a.jpg", "brighter", "-o", "out.png"]);
        match cli.command {
            Commands::Edit(args) => {
                assert_eq!(args.output, Some(std::path::PathBuf::from("out.png")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
