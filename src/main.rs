use clap::{Parser, Subcommand};
use rendition::batch::{self, RenderOptions};
use rendition::catalog::Catalog;
use rendition::config::ToolConfig;
use rendition::storage::{FileSystemStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rendition")]
#[command(about = "Render and inspect image-field variations for a content catalog")]
#[command(long_about = "\
Render and inspect image-field variations for a content catalog

Image-bearing fields are addressed as <app>.<model>.<field> and declared in
a JSON catalog alongside their records. Each field carries an ordered list
of variations (thumbnail sizes, crops); `rendition render` generates the
missing variation files next to their sources in the media storage.

Configuration is read from rendition.toml (catalog path, media root,
public base URL); every value can be overridden on the command line.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "rendition.toml", global = true)]
    config: PathBuf,

    /// Catalog document (overrides config)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Media storage root (overrides config)
    #[arg(long, global = true)]
    media_root: Option<PathBuf>,

    /// Public base URL for stored files (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render all configured variations of the given image fields
    Render(RenderArgs),
    /// List registered image fields with their variations and record counts
    Fields,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Image fields to render, as <app>.<model>.<field>
    #[arg(required = true, value_name = "FIELD_PATH")]
    field_paths: Vec<String>,

    /// Replace existing variation files
    #[arg(long)]
    replace: bool,

    /// Skip files whose source is missing from storage instead of aborting
    #[arg(short = 'i', long)]
    ignore_missing: bool,

    /// Print one line per file instead of a progress bar
    #[arg(long)]
    no_progress: bool,
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ToolConfig::load(&cli.config)?;
    if let Some(catalog) = &cli.catalog {
        config.catalog = catalog.display().to_string();
    }
    if let Some(media_root) = &cli.media_root {
        config.media_root = media_root.display().to_string();
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = Some(base_url.clone());
    }
    config.validate()?;

    let catalog = Catalog::load(config.catalog.as_ref())?;
    let storage: Arc<dyn Storage> = match &config.base_url {
        Some(base_url) => Arc::new(FileSystemStorage::with_base_url(
            &config.media_root,
            base_url,
        )),
        None => Arc::new(FileSystemStorage::new(&config.media_root)),
    };

    match cli.command {
        Command::Render(args) => {
            let options = RenderOptions {
                replace: args.replace,
                ignore_missing: args.ignore_missing,
                no_progress: args.no_progress,
            };
            let stats =
                batch::render_field_paths(&catalog, &storage, &args.field_paths, &options)?;
            println!("{stats}");
        }
        Command::Fields => {
            for (path, resolved) in catalog.fields() {
                let variations: Vec<&str> = resolved
                    .entry
                    .variations
                    .iter()
                    .map(|v| v.name.as_str())
                    .collect();
                println!(
                    "{path} ({} records) [{}]",
                    resolved.count(),
                    variations.join(", ")
                );
            }
        }
    }

    Ok(())
}
