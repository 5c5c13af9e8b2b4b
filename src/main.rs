use anyhow::Result;
use clap::{Parser, Subcommand};
use postindex::build::build_index;
use postindex::config::Config;
use postindex::serve::serve;
use postindex::write::{INDEX_FILE_NAME, METADATA_FILE_NAME};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The directory to start looking for `postindex.yaml` in.
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the post metadata and search index into the output directory.
    Index,

    /// Serve the metadata, search index and RSS feed over HTTP.
    Serve,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postindex=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_directory(&cli.project)?;

    match cli.command {
        Command::Index => {
            let summary = build_index(&config)?;
            info!(
                posts = summary.posts,
                directory = %summary.output_directory.display(),
                "index built"
            );
            println!(
                "Finished generating {} and {}!",
                METADATA_FILE_NAME, INDEX_FILE_NAME
            );
        }
        Command::Serve => serve(&config)?,
    }
    Ok(())
}
