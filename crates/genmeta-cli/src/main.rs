// File: crates/genmeta-cli/src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use genmeta_core::export::{copy_all_text, workflow_file_name, workflow_json};
use genmeta_core::extract_png;
use std::path::{Path, PathBuf};

/// A tool to show and export the generation parameters embedded in PNG images.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debug logs (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the generation parameters of an image
    View {
        /// The path to the image
        #[arg(required = true)]
        file_path: PathBuf,

        /// Print the full record, workflow included, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the embedded workflow graph as a JSON file
    Workflow {
        /// The path to the image
        #[arg(required = true)]
        file_path: PathBuf,

        /// Where to write the workflow (defaults to `<stem>_workflow.json` next to the image)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn read_image(file_path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(file_path)
        .await
        .with_context(|| format!("Failed to read file: {}", file_path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::View { file_path, json } => {
            let file_bytes = read_image(&file_path).await?;
            let metadata = extract_png(&file_bytes, file_path.display().to_string())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&metadata)?);
            } else if !metadata.has_generation_data() {
                println!("No generation metadata found in {}.", file_path.display());
            } else {
                println!("Generation parameters for {}:", file_path.display());
                for line in copy_all_text(&metadata).lines() {
                    println!("  {line}");
                }
                if metadata.workflow_raw.is_some() {
                    println!("  (workflow graph embedded; export it with `genmeta workflow`)");
                }
            }
        }

        Commands::Workflow { file_path, output } => {
            let file_bytes = read_image(&file_path).await?;
            let image_path = file_path.display().to_string();
            let metadata = extract_png(&file_bytes, image_path.as_str())?;

            let workflow = workflow_json(&metadata)
                .with_context(|| format!("Cannot export a workflow from {}", file_path.display()))?;

            let output_path =
                output.unwrap_or_else(|| file_path.with_file_name(workflow_file_name(&image_path)));

            tokio::fs::write(&output_path, workflow)
                .await
                .with_context(|| format!("Failed to write workflow to {}", output_path.display()))?;

            log::info!("wrote workflow for {image_path}");
            println!("Workflow saved to: {}", output_path.display());
        }
    }

    Ok(())
}
