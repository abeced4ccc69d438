//! Tile explorer CLI.
//!
//! One-shot subcommands query the backend and print tables; `session`
//! starts the interactive explorer on stdin.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::BufReader;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use explorer::{repl, Explorer, ExplorerConfig, Report};
use explorer_client::urls::xyz_tile_url;
use explorer_client::{DatasetQuery, TileClient};
use explorer_common::{DatasetIdentity, Stretch};
use explorer_state::Channel;

#[derive(Parser)]
#[command(name = "explorer")]
#[command(about = "Browse datasets and build tile URLs for a raster tile backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = "EXPLORER_HOST")]
    host: Option<String>,

    /// Path to a YAML config file
    #[arg(long, global = true, env = "EXPLORER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, env = "EXPLORER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// List the keys that identify a dataset
    Keys {
        /// Output format: table (default), json
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// List datasets, optionally filtered by key values
    Datasets {
        /// Key constraint, e.g. --where type=landsat (repeatable)
        #[arg(short = 'w', long = "where", value_parser = parse_constraint)]
        constraints: Vec<(String, String)>,

        /// Zero-based page
        #[arg(short, long, default_value = "0")]
        page: u32,

        /// Datasets per page (defaults to the configured page size)
        #[arg(short, long)]
        limit: Option<u32>,

        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Show metadata for one dataset
    Metadata {
        /// Key values in key order
        #[arg(required = true)]
        values: Vec<String>,

        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Build a tile URL template
    TileUrl {
        #[command(subcommand)]
        layer: TileLayer,

        /// Fill the template with one tile, as Z/X/Y
        #[arg(long, global = true, value_parser = parse_tile)]
        tile: Option<(u32, u32, u32)>,

        /// Download that tile to this path
        #[arg(long, global = true, requires = "tile")]
        out: Option<PathBuf>,
    },

    /// Show the colours of a colormap
    Colormap {
        /// Colormap id, e.g. viridis
        id: String,

        /// Number of samples (defaults to the configured value)
        #[arg(short, long)]
        num_values: Option<u32>,
    },

    /// Download a singleband preview image
    Preview {
        /// Key values in key order
        #[arg(required = true)]
        values: Vec<String>,

        /// Output PNG path
        #[arg(long)]
        out: PathBuf,

        #[arg(long)]
        colormap: Option<String>,
    },

    /// Interactive explorer reading commands from stdin
    Session,
}

#[derive(Subcommand)]
enum TileLayer {
    /// Colormapped single band
    Singleband {
        /// Key values in key order
        #[arg(required = true)]
        values: Vec<String>,

        #[arg(long)]
        colormap: Option<String>,

        /// Stretch range as MIN,MAX (defaults to the percentile clip)
        #[arg(long, value_parser = parse_stretch)]
        stretch: Option<Stretch>,

        /// Print the preview URL instead of the XYZ template
        #[arg(long)]
        preview: bool,
    },

    /// RGB composite of three bands
    Rgb {
        /// Values of every key except the band key
        #[arg(required = true)]
        index: Vec<String>,

        #[arg(long)]
        r: String,

        #[arg(long)]
        g: String,

        #[arg(long)]
        b: String,

        #[arg(long)]
        preview: bool,
    },
}

fn parse_constraint(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))
}

fn parse_tile(s: &str) -> Result<(u32, u32, u32), String> {
    let parts: Vec<u32> = s
        .split('/')
        .map(|p| p.parse().map_err(|_| format!("expected Z/X/Y, got '{}'", s)))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [z, x, y] => Ok((*z, *x, *y)),
        _ => Err(format!("expected Z/X/Y, got '{}'", s)),
    }
}

fn parse_stretch(s: &str) -> Result<Stretch, String> {
    Stretch::parse(s).ok_or_else(|| format!("expected MIN,MAX, got '{}'", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format)?;

    let mut config = match &cli.config {
        Some(path) => ExplorerConfig::from_file(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(host) = &cli.host {
        config = config.with_host(host);
    }
    config.validate()?;
    info!(host = %config.host, "Explorer configured");

    match cli.command {
        Commands::Keys { output } => {
            let client = TileClient::new(config.client_config())?;
            let keys = client.keys().await?;
            match output.as_str() {
                "json" => println!("{}", Report::format_json(&keys)?),
                _ => println!("{}", Report::format_keys(&keys)),
            }
        }
        Commands::Datasets {
            constraints,
            page,
            limit,
            output,
        } => {
            let client = TileClient::new(config.client_config())?;
            let keys = client.keys().await?;
            let mut query = DatasetQuery::new(limit.unwrap_or(config.page_size));
            for (key, value) in &constraints {
                query.set_constraint(key, value);
            }
            query.set_page(page);
            let listing = client.datasets(&query).await?;
            match output.as_str() {
                "json" => println!("{}", Report::format_json(&listing)?),
                _ => println!("{}", Report::format_datasets(&keys, &listing.datasets, &query)),
            }
        }
        Commands::Metadata { values, output } => {
            let client = TileClient::new(config.client_config())?;
            let identity = DatasetIdentity::new(values);
            let metadata = client.metadata(&identity).await?;
            match output.as_str() {
                "json" => println!("{}", Report::format_json(&metadata)?),
                _ => println!("{}", Report::format_metadata(&identity, &metadata)),
            }
        }
        Commands::TileUrl { layer, tile, out } => {
            let mut explorer = Explorer::new(&config)?;
            let (url, preview) = match layer {
                TileLayer::Singleband {
                    values,
                    colormap,
                    stretch,
                    preview,
                } => {
                    activate_singleband(&mut explorer, values, colormap.as_deref(), stretch).await?;
                    (explorer_url(&explorer, preview), preview)
                }
                TileLayer::Rgb { index, r, g, b, preview } => {
                    activate_rgb(&mut explorer, &index, [r, g, b]).await?;
                    (explorer_url(&explorer, preview), preview)
                }
            };
            let Some(mut url) = url else {
                bail!("no layer could be activated{}", if preview { " for preview" } else { "" });
            };
            if let Some((z, x, y)) = tile {
                url = xyz_tile_url(&url, z, x, y);
            }
            println!("{}", url);
            if let Some(out) = out {
                let bytes = explorer.fetch_image(&url).await?;
                tokio::fs::write(&out, &bytes).await?;
                println!("Wrote {} bytes to {}", bytes.len(), out.display());
            }
        }
        Commands::Colormap { id, num_values } => {
            let client = TileClient::new(config.client_config())?;
            let entries = client
                .colormap(&id, num_values.unwrap_or(config.colormap_values))
                .await?;
            println!("{}", Report::format_colormap(&id, &entries));
        }
        Commands::Preview { values, out, colormap } => {
            let mut explorer = Explorer::new(&config)?;
            activate_singleband(&mut explorer, values, colormap.as_deref(), None).await?;
            let Some(url) = explorer.active_preview_url() else {
                bail!("no layer could be activated");
            };
            let bytes = explorer.fetch_image(&url).await?;
            tokio::fs::write(&out, &bytes).await?;
            println!("Wrote {} bytes to {}", bytes.len(), out.display());
        }
        Commands::Session => {
            let mut explorer = Explorer::new(&config)?;
            explorer.connect().await?;
            if let Err(e) = explorer.load_page().await {
                warn!(error = %e, "Initial listing failed");
            }
            println!("{}", Report::format_keys(explorer.keys()));
            println!("Type 'help' for commands.");

            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run(&mut explorer, stdin, &mut stdout).await?;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries command output
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

async fn activate_singleband(
    explorer: &mut Explorer,
    values: Vec<String>,
    colormap: Option<&str>,
    stretch: Option<Stretch>,
) -> Result<()> {
    if let Some(colormap) = colormap {
        explorer.set_colormap(colormap)?;
    }
    explorer.select_singleband(DatasetIdentity::new(values)).await?;
    if let Some(stretch) = stretch {
        explorer.set_stretch(stretch)?;
    }
    Ok(())
}

async fn activate_rgb(explorer: &mut Explorer, index: &[String], bands: [String; 3]) -> Result<()> {
    let keys = explorer.connect().await?.to_vec();
    if index.len() + 1 != keys.len() {
        bail!(
            "expected {} index values (every key except '{}'), got {}",
            keys.len().saturating_sub(1),
            keys.last().map(|k| k.original.as_str()).unwrap_or("band"),
            index.len()
        );
    }
    for (key, value) in keys.iter().zip(index) {
        explorer.set_constraint(&key.original, value)?;
    }
    for (channel, band) in Channel::ALL.into_iter().zip(bands.iter()) {
        explorer.select_rgb_band(channel, band).await?;
    }
    Ok(())
}

fn explorer_url(explorer: &Explorer, preview: bool) -> Option<String> {
    if preview {
        explorer.active_preview_url()
    } else {
        explorer.tile_url()
    }
}
