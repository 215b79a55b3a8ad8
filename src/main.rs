// pdfharvest - extract informative images and text from native PDFs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use pdfharvest::{
    create_output_folder, export_page_images_png, extract_all_images, extract_images, extract_text,
    HarvestConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Extract embedded images and text from PDF files")]
struct Args {
    /// TOML file with output and filter settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); falls back to RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write embedded images, skipping small and uniform ones
    Images {
        pdf_file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Images must be larger than this many bytes
        #[arg(long, conflicts_with = "all")]
        min_size: Option<usize>,
        /// Write every image without filtering
        #[arg(long)]
        all: bool,
    },
    /// Write the document text to text.txt
    Text {
        pdf_file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode every image and save it as PNG
    Png {
        pdf_file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Filtered images plus text
    All {
        pdf_file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut config = match &args.config {
        Some(path) => HarvestConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };

    match args.command {
        Command::Images { pdf_file, output, min_size, all } => {
            let folder = output.unwrap_or(config.output_dir);
            let written = if all {
                extract_all_images(&pdf_file, &folder)
            } else {
                if let Some(min_size) = min_size {
                    config.images.min_size = min_size;
                }
                extract_images(&pdf_file, &folder, &config.images)
            };
            print_paths(&written);
        }
        Command::Text { pdf_file, output } => {
            let folder = output.unwrap_or(config.output_dir);
            run_text(&pdf_file, &folder)?;
        }
        Command::Png { pdf_file, output } => {
            let folder = output.unwrap_or(config.output_dir);
            print_paths(&export_page_images_png(&pdf_file, &folder));
        }
        Command::All { pdf_file, output } => {
            let folder = output.unwrap_or(config.output_dir);
            print_paths(&extract_images(&pdf_file, &folder, &config.images));
            run_text(&pdf_file, &folder)?;
        }
    }

    Ok(())
}

fn run_text(pdf_file: &Path, folder: &Path) -> Result<()> {
    let folder = create_output_folder(folder)
        .with_context(|| format!("Failed to create {}", folder.display()))?;
    if let Some(path) = extract_text(pdf_file, &folder) {
        println!("{}", path.display());
    }
    Ok(())
}

fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .init();
}
