use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{info, warn};

mod analysis;
mod config;
mod db;
mod handlers;
mod image_store;
mod llm;
mod state;
mod utils;

use config::Config;
use handlers::commands::{self, AddOptions};
use state::AppState;
use utils::logging::init_logging;

/// Catalog images with AI-generated, human-reviewed metadata.
#[derive(Parser, Debug)]
#[command(name = "image-catalog")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload an image, analyze it, review the metadata and save it
    Add {
        /// JPEG or PNG file to catalog
        file: PathBuf,
        /// Image ID to use instead of the suggested one
        #[arg(long)]
        id: Option<String>,
        /// Skip AI analysis and start from an empty form
        #[arg(long)]
        manual: bool,
        /// Save without the interactive review
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Run AI analysis on a file and print the result without saving
    Analyze {
        file: PathBuf,
    },
    /// Show the catalog
    List,
    /// Show every field of one record
    Show {
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    dotenv().ok();
    let config = Config::load();
    let _guards = init_logging(&config);
    for notice in &config.notices {
        warn!("{notice}");
    }

    let state = AppState::init(config).await?;
    info!(
        "Catalog database at {}, data in {}",
        state.catalog.path().display(),
        state.config.data_dir.display()
    );
    if !state.extractor.is_configured() {
        warn!("Running without AI analysis; manual entry and browsing remain available");
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();

    let succeeded = match cli.command {
        Command::Add {
            file,
            id,
            manual,
            yes,
        } => {
            let options = AddOptions {
                file,
                image_id: id,
                manual,
                assume_yes: yes,
            };
            commands::add_command(&state, &options, &mut input, &mut output).await?;
            true
        }
        Command::Analyze { file } => commands::analyze_command(&state, &file, &mut output).await?,
        Command::List => {
            commands::list_command(&state, &mut output).await?;
            true
        }
        Command::Show { id } => commands::show_command(&state, &id, &mut output).await?,
    };

    state.catalog.close().await;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
